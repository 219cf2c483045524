#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use anyhow::{anyhow, Result};
use countdown_core::config::AppConfig;
use countdown_core::settings::{SettingsStore, WindowGeometry};
use eframe::egui;

mod app;
mod gamepad;
mod heatmap_view;
mod hotkeys;
mod logging;
mod theme;

use app::CountdownApp;

const DEFAULT_SIZE: [f32; 2] = [420.0, 360.0];
const MIN_SIZE: [f32; 2] = [260.0, 180.0];

fn main() -> Result<()> {
    let config = AppConfig::from_args()?;
    let adopted = config.prepare()?;
    logging::enable_logging(&config.data_dir, cfg!(debug_assertions))?;
    tracing::info!(data_dir = %config.data_dir.display(), "starting Countdown Master");
    if let Some(legacy) = adopted {
        tracing::info!(from = %legacy.display(), "adopted legacy settings file");
    }

    let settings = SettingsStore::open(config.settings_path());
    let ui = settings.load_ui();
    let viewport = viewport_for(settings.load_window(), ui.always_on_top);

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Countdown Master",
        native_options,
        Box::new(move |cc| {
            theme::configure_interaction_style(&cc.egui_ctx);
            cc.egui_ctx.set_theme(egui::ThemePreference::Dark);
            Ok(Box::new(CountdownApp::new(&cc.egui_ctx, config.clone())))
        }),
    )
    .map_err(|err| anyhow!("failed to start Countdown Master: {err}"))
}

fn viewport_for(window: Option<WindowGeometry>, always_on_top: bool) -> egui::ViewportBuilder {
    let mut viewport = egui::ViewportBuilder::default()
        .with_title("Countdown Master")
        .with_min_inner_size(MIN_SIZE)
        .with_transparent(true)
        .with_window_level(if always_on_top {
            egui::WindowLevel::AlwaysOnTop
        } else {
            egui::WindowLevel::Normal
        });
    match window {
        Some(geometry) => {
            viewport = viewport.with_inner_size([geometry.width as f32, geometry.height as f32]);
            if let (Some(x), Some(y)) = (geometry.x, geometry.y) {
                viewport = viewport.with_position([x as f32, y as f32]);
            }
        }
        None => viewport = viewport.with_inner_size(DEFAULT_SIZE),
    }
    viewport
}
