mod app;
mod bus;
mod config;
mod error;
mod icons;
mod ipc;
mod loader;
mod logging;
mod overlay;
mod session;
mod signals;
mod surface;
mod theme;
mod timer;
mod view;
mod views;

fn main() -> Result<(), iced_layershell::Error> {
    // Logging depends on the config, so anything load() logs is dropped.
    let config = config::load();
    logging::init(config.overlay.debug);
    tracing::info!("config: {}", config::config_file_path().display());
    tracing::debug!("config: {config:?}");
    app::run(config)
}
