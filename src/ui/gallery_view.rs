use crate::app::RelaxRoomApp;
use egui::{CornerRadius, Image, RichText, Ui};

pub fn draw_gallery_page(app: &mut RelaxRoomApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.heading("Images");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Rescan").clicked() {
                app.rescan_gallery();
            }
        });
    });
    ui.label(RichText::new("Looking without doing anything.").weak());
    ui.add_space(12.0);

    if app.gallery.is_empty() {
        let dir = app.settings.images_root(&app.config_dir);
        ui.label(
            RichText::new(format!("Put some .jpg or .png files in {}", dir.display())).weak(),
        );
        return;
    }

    ui.columns(2, |cols| {
        for (i, path) in app.gallery.iter().enumerate() {
            let ui = &mut cols[i % 2];
            let width = ui.available_width();
            ui.add(
                Image::new(format!("file://{}", path.display()))
                    .max_width(width)
                    .corner_radius(CornerRadius::same(16)),
            );
            ui.add_space(8.0);
        }
    });
}
