mod adapter;
mod raw;

pub use grid_types::Grid;

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error(s): {0}")]
    Validation(String),
}

/// Load a grid configuration from a file path.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration file cannot be read or parsed.
pub fn load_from_path(path: &std::path::Path) -> Result<Grid, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_toml(&text)
}

/// Parse a grid configuration from a TOML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
pub fn parse_toml(config: &str) -> Result<Grid, ConfigError> {
    let raw_grid = toml::from_str::<raw::RawGrid>(config)?;
    raw_grid.to_grid()
}
