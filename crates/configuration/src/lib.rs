use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod logging;
pub mod settings;
pub mod simulation;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::BacktestOverrides;
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{BacktestSettings, Config, DataSettings, LoggingSettings};
pub use simulation::{Commission, DataConfig, SimulationConfig};

/// Loads the application configuration.
///
/// Reads `path` (the `.toml` extension may be omitted) when it exists, then
/// layers `REBAL__SECTION__KEY` environment variables on top, and
/// deserializes the result into our strongly-typed `Config` struct.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("REBAL").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    tracing::debug!(path = %path.display(), ?config, "Configuration loaded");

    Ok(config)
}

/// Parses configuration from an in-memory TOML document.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    Ok(builder.try_deserialize::<Config>()?)
}
