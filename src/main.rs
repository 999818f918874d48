mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::DashboardApp;
use config::{DashboardConfig, CONFIG_FILE};
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE));
    let mut state = AppState::new(config);

    let data_path = state.config.data_path.clone();
    if data_path.exists() {
        state.load_or_report(&data_path);
    } else {
        log::info!(
            "{} not found, waiting for a file to be opened",
            data_path.display()
        );
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
