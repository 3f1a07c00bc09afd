use crate::app::SPECIAL_MESSAGE;
use egui::{CornerRadius, Frame, Margin, RichText, Stroke, Ui};

// Drawn while the window wears the Xmas palette.
pub fn draw_christmas_page(ui: &mut Ui) {
    ui.heading("Christmas");
    ui.label(RichText::new("A small, calm place, all yours.").weak());
    ui.add_space(12.0);

    let visuals = ui.visuals().clone();
    Frame::new()
        .fill(visuals.window_fill)
        .stroke(Stroke::new(1.0, visuals.selection.stroke.color))
        .corner_radius(CornerRadius::same(20))
        .inner_margin(Margin::same(20))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(SPECIAL_MESSAGE).size(15.0));
        });
}
