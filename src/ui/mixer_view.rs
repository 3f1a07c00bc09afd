// src/ui/mixer_view.rs

use crate::app::RelaxRoomApp;
use crate::diary::most_recent;
use crate::scene::SCENES;
use crate::theme::RootStyle;
use chrono::{DateTime, Local};
use egui::{
    epaint, vec2, Button, Color32, CornerRadius, Frame, Margin, Pos2, Rect, Response, RichText,
    Sense, Stroke, Ui,
};

const CARD_HEIGHT: f32 = 64.0;

pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

// Horizontal volume fader over the 0..=1 range.
fn volume_fader(ui: &mut Ui, value: &mut f32, style: &RootStyle) -> Response {
    let desired_size = vec2(ui.available_width().max(40.0), 18.0);
    let (rect, mut response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

    if response.dragged() || response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let relative_x = (pos.x - rect.left()) / rect.width();
            *value = relative_x.clamp(0.0, 1.0);
            response.mark_changed();
        }
    }

    if ui.is_rect_visible(rect) {
        let painter = ui.painter_at(rect);

        painter.rect(
            rect,
            CornerRadius::same(9),
            Color32::from_black_alpha(60),
            Stroke::new(1.0, Color32::from_white_alpha(25)),
            epaint::StrokeKind::Inside,
        );

        let fill_width = rect.width() * value.clamp(0.0, 1.0);
        let fill_rect = Rect::from_min_size(rect.left_top(), vec2(fill_width, rect.height()));
        painter.rect_filled(fill_rect, CornerRadius::same(9), style.glow().gamma_multiply(0.6));

        let thumb_center = Pos2::new(rect.left() + fill_width, rect.center().y);
        painter.circle(thumb_center, 8.0, style.glow(), Stroke::new(1.0, Color32::WHITE));
    }

    response
}

pub fn draw_relax_room_page(app: &mut RelaxRoomApp, ui: &mut Ui) {
    ui.heading("Relax room");
    ui.label(RichText::new("Pick a sound. Breathe. Slow down.").weak());
    ui.add_space(8.0);

    if ui.button("✨ Special moment").clicked() {
        app.special_open = true;
    }
    ui.add_space(12.0);

    draw_sound_mixer(app, ui);
    ui.add_space(12.0);
    draw_recent_notes(app, ui);
}

fn draw_sound_mixer(app: &mut RelaxRoomApp, ui: &mut Ui) {
    let style = app.mixer.root_style().clone();
    let state = *app.mixer.state();
    let current = state.scene_id.scene();

    Frame::new()
        .fill(style.card_fill(false))
        .corner_radius(CornerRadius::same(20))
        .inner_margin(Margin::same(16))
        .show(ui, |ui| {
            ui.label(RichText::new("Sound mixer").strong().size(18.0));
            ui.label(
                RichText::new(format!(
                    "Choose a scene. The change is smooth ({} ms crossfade).",
                    app.mixer.crossfade_duration().as_millis()
                ))
                .weak(),
            );
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Scene:");
                ui.label(RichText::new(current.label).strong());
                if state.transitioning {
                    ui.label(RichText::new("• transitioning…").weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if state.is_playing { "Pause" } else { "Play" };
                    if ui.add(Button::new(label).min_size(vec2(72.0, 28.0))).clicked() {
                        app.mixer.toggle();
                    }
                });
            });

            if state.needs_gesture {
                ui.add_space(6.0);
                Frame::new()
                    .fill(Color32::from_rgba_unmultiplied(253, 230, 138, 30))
                    .corner_radius(CornerRadius::same(12))
                    .inner_margin(Margin::same(10))
                    .show(ui, |ui| {
                        ui.label("Audio was blocked: press Play to start it.");
                    });
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("Vol").small());
                let mut volume = state.volume;
                let percent = format!("{:>3}%", (volume * 100.0).round() as u32);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(percent).small().monospace());
                    if volume_fader(ui, &mut volume, &style).changed() {
                        app.mixer.set_volume(volume);
                    }
                });
            });

            ui.add_space(10.0);
            ui.columns(2, |cols| {
                for (i, scene) in SCENES.iter().enumerate() {
                    let ui = &mut cols[i % 2];
                    let selected = scene.id == state.scene_id;
                    let text = RichText::new(format!("{}\n{}", scene.label, scene.subtitle));
                    let button = Button::new(text)
                        .selected(selected)
                        .fill(style.card_fill(selected))
                        .min_size(vec2(ui.available_width(), CARD_HEIGHT));
                    if ui.add_enabled(!state.transitioning, button).clicked() {
                        app.mixer.switch_scene(scene.id);
                    }
                    ui.add_space(6.0);
                }
            });
        });
}

fn draw_recent_notes(app: &mut RelaxRoomApp, ui: &mut Ui) {
    let recent = most_recent(&app.notes, 2);
    if recent.is_empty() {
        return;
    }
    ui.label(RichText::new("📝 Latest notes").strong());
    ui.columns(2, |cols| {
        for (col, note) in cols.iter_mut().zip(recent.iter()) {
            Frame::group(col.style()).show(col, |ui| {
                ui.label(RichText::new(&note.title).strong());
                let preview: String = note.body.chars().take(120).collect();
                ui.label(preview);
                ui.label(RichText::new(format_timestamp(note.updated_at)).small().weak());
            });
        }
    });
}
