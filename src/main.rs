#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
use log4rs::config::Deserializers;
use screen_ocr::ScreenOcrApp;
use screen_ocr::settings::config_dir;
use std::fs;

#[tokio::main]
async fn main() -> eframe::Result {
    init_logger();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([360.0, 200.0])
            .with_min_inner_size([300.0, 160.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Screen OCR",
        native_options,
        Box::new(|cc| Ok(Box::new(ScreenOcrApp::new(cc)))),
    )
}

const LOG_CONFIG_FILENAME: &str = "log4rs.yaml";

fn init_logger() {
    let dir = config_dir();
    fs::create_dir_all(&dir).expect("Config directory creation failed");

    let log_config = dir.join(LOG_CONFIG_FILENAME);
    if !log_config.exists() {
        fs::write(&log_config, include_str!("../config/log4rs.yaml"))
            .expect("Config file creation failed");
    }

    log4rs::init_file(&log_config, Deserializers::default()).expect("Logger init failed");
}
