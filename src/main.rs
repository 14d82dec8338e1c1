#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]
// On Windows hide console in release builds. Debug keeps console for diagnostics.

use anyhow::{anyhow, Result};
use eframe::{egui, NativeOptions};

use open_translate::client::HttpBackend;
use open_translate::gui::{fonts, TranslateApp};
use open_translate::i18n;
use open_translate::settings::Settings;

const APP_NAME: &str = "Open Translate";
const APP_ID: &str = "open-translate";

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    // Default filter suppresses noisy WGPU/eframe warnings (like surface timeouts)
    let default_directives = "info,egui=error,epaint=error,eframe=error,egui_wgpu=error,wgpu=error,wgpu_core=error,wgpu_hal=error,naga=error,reqwest=warn";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    tracing::info!("{} version {}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let settings = Settings::load();
    i18n::set_ui_language_preference(&settings.ui_language);
    let backend = HttpBackend::new(&settings.api_base(), settings.timeout())
        .map_err(|e| anyhow!("cannot create backend client: {}", e))?;
    tracing::info!("backend: {}", backend.base());

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_app_id(APP_ID) // Wayland app_id
            .with_title(APP_NAME)
            .with_inner_size(egui::vec2(1000.0, 680.0))
            .with_min_inner_size(egui::vec2(640.0, 420.0))
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        // Some Linux compositors time out waiting on vsync and spam warnings
        vsync: !cfg!(target_os = "linux"),
        centered: true,
        ..Default::default()
    };
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| {
            fonts::setup_custom_fonts(&cc.egui_ctx);
            Ok(Box::new(TranslateApp::new(&cc.egui_ctx, settings, backend)))
        }),
    )
    .map_err(|e| anyhow!("UI terminated with error: {}", e))?;

    Ok(())
}
