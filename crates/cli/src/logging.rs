use flowsnap_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Installs the global subscriber from the effective config. An invalid config
/// falls back to defaults here; the command itself reports the config failure.
pub fn init_from_env() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config);
}

/// Logs go to stderr so stdout carries only the command outcome line.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("logging already initialised: {error}");
    }
}
