use crate::app::{Page, RelaxRoomApp, SPECIAL_MESSAGE};
use crate::ui;
use egui::{
    vec2, Align2, Area, Button, CentralPanel, Frame, Id, Key, Margin, Order, RichText,
    ScrollArea, TopBottomPanel, Window,
};

pub fn draw_main_view(app: &mut RelaxRoomApp, ctx: &egui::Context) {
    if app.special_open {
        draw_special_moment(app, ctx);
    }
    if app.welcome_toast.is_some() {
        draw_welcome_toast(ctx);
    }

    TopBottomPanel::top("navbar")
        .frame(Frame::NONE.fill(ctx.style().visuals.panel_fill).inner_margin(Margin::symmetric(12, 8)))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("✨ Relax Room").strong().size(16.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    // Right-to-left, so iterate backwards to keep reading order.
                    for page in Page::NAV.iter().rev() {
                        let button = Button::new(page.label()).selected(app.page == *page);
                        if ui.add(button).clicked() {
                            app.page = *page;
                            if *page == Page::Diary {
                                app.refresh_notes();
                            }
                        }
                    }
                });
            });
        });

    TopBottomPanel::bottom("diary_dock")
        .resizable(false)
        .frame(Frame::NONE.fill(ctx.style().visuals.window_fill).inner_margin(Margin::same(12)))
        .show(ctx, |ui| {
            ui::draw_diary_dock(app, ui);
        });

    CentralPanel::default().show(ctx, |ui| {
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.add_space(8.0);
            match app.page {
                Page::Christmas => ui::draw_christmas_page(ui),
                Page::RelaxRoom => ui::draw_relax_room_page(app, ui),
                Page::Images => ui::draw_gallery_page(app, ui),
                Page::Diary => ui::draw_diary_page(app, ui),
            }
        });
    });
}

fn draw_special_moment(app: &mut RelaxRoomApp, ctx: &egui::Context) {
    let mut is_open = app.special_open;
    let mut close_clicked = false;

    Window::new("A message for you")
        .open(&mut is_open)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(RichText::new("A tiny moment, but a real one.").weak());
            ui.add_space(8.0);
            Frame::group(ui.style()).show(ui, |ui| {
                ui.label(RichText::new(SPECIAL_MESSAGE).size(15.0));
            });
            ui.add_space(8.0);
            if ui.button("Close").clicked() {
                close_clicked = true;
            }
        });

    if close_clicked || ctx.input(|i| i.key_pressed(Key::Escape)) {
        is_open = false;
    }
    app.special_open = is_open;
}

fn draw_welcome_toast(ctx: &egui::Context) {
    Area::new(Id::new("welcome_toast"))
        .order(Order::Foreground)
        .anchor(Align2::CENTER_TOP, vec2(0.0, 48.0))
        .show(ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(RichText::new("🎄 Merry Christmas!").size(16.0));
            });
        });
}
