// Prevent console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod commands;
mod engine;
mod message;
mod page_canvas;
mod shortcuts;
mod ui;
mod ui_document;
mod ui_settings;
mod ui_welcome;
mod update;

use app::PdfCropApp;
use mimalloc::MiMalloc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn main() -> iced::Result {
    human_panic::setup_panic!();
    init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting pdfcrop");

    iced::application(PdfCropApp::new, PdfCropApp::update, PdfCropApp::view)
        .title(PdfCropApp::title)
        .subscription(PdfCropApp::subscription)
        .window_size((1200.0, 900.0))
        .run()
}
