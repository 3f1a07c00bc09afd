use crate::app::RelaxRoomApp;
use crate::ui::mixer_view::format_timestamp;
use egui::{Button, Frame, RichText, TextEdit, Ui};

pub fn draw_diary_page(app: &mut RelaxRoomApp, ui: &mut Ui) {
    ui.heading("Diary");
    ui.label(RichText::new("Free thoughts. No form. No judgement.").weak());
    ui.add_space(12.0);

    if app.notes.is_empty() {
        ui.label(RichText::new("No notes yet.").weak());
        return;
    }

    let mut to_delete = None;
    let mut to_edit = None;
    for note in &app.notes {
        Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new(&note.title).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Delete").clicked() {
                        to_delete = Some(note.id.clone());
                    }
                    if ui.small_button("Edit").clicked() {
                        to_edit = Some(note.clone());
                    }
                    ui.label(RichText::new(format_timestamp(note.updated_at)).small().weak());
                });
            });
            ui.label(&note.body);
        });
        ui.add_space(6.0);
    }

    if let Some(note) = to_edit {
        app.dock.start_edit(&note);
    }
    if let Some(id) = to_delete {
        app.delete_note(&id);
    }
}

pub fn draw_diary_dock(app: &mut RelaxRoomApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("📝 Diary").strong());
        ui.label(RichText::new("Write here. Even if it's ugly. Even if it's little.").small().weak());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let toggle = if app.dock.open { "Close" } else { "Open" };
            if ui.button(toggle).clicked() {
                if app.dock.open {
                    app.dock.open = false;
                } else {
                    app.dock.start_new();
                }
            }
            if app.dock.saved_ping.is_some() {
                ui.label(RichText::new("Saved ✓").small());
            }
        });
    });

    if !app.dock.open {
        return;
    }

    ui.add_space(6.0);
    if app.dock.editing_id.is_some() {
        ui.label(RichText::new("Editing a note").small().weak());
    }
    ui.add(
        TextEdit::singleline(&mut app.dock.title)
            .hint_text("Title")
            .desired_width(f32::INFINITY),
    );
    ui.add(
        TextEdit::multiline(&mut app.dock.text)
            .hint_text("Write here…")
            .desired_rows(4)
            .desired_width(f32::INFINITY),
    );
    if let Some(error) = &app.dock.error {
        ui.colored_label(ui.visuals().warn_fg_color, error);
    }
    ui.horizontal(|ui| {
        ui.label(RichText::new("Saved locally on this computer").small().weak());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.add_enabled(app.dock.can_save(), Button::new("Save")).clicked() {
                app.save_dock();
            }
        });
    });
}
