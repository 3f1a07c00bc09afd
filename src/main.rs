#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod diary;
mod logging;
mod mixer;
mod playback;
mod scene;
mod settings;
mod storage;
mod theme;
mod ui;

use crate::app::RelaxRoomApp;

fn main() -> anyhow::Result<()> {
    logging::init_logger();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Relax Room")
            .with_inner_size([960.0, 720.0]),
        ..Default::default()
    };

    let run_result = eframe::run_native(
        "Relax Room",
        native_options,
        Box::new(|cc| {
            let app = RelaxRoomApp::new(cc)?;
            Ok(Box::new(app))
        }),
    );

    if let Err(e) = run_result {
        return Err(anyhow::anyhow!("Eframe run error: {}", e));
    }

    Ok(())
}
