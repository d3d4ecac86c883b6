#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;

use app::UiApp;
use eframe::{NativeOptions, egui};

fn main() {
    tracing_subscriber::fmt::init();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 640.0])
            .with_min_inner_size([360.0, 520.0]),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "Animal Classifier",
        options,
        Box::new(|_cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::default()))
        }),
    ) {
        eprintln!("Application stopped with error: {e}");
    }
}
