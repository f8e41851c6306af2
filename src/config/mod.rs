mod types;

pub use types::*;

use reelvault_common::ConfigError;
use std::path::Path;

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return the default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./reelvault.toml", "./config.toml"];
    for path_str in default_paths {
        let path = Path::new(path_str);
        if path.exists() {
            return load_config(path);
        }
    }

    let config = Config::default();
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration invariants.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.upload_chunk_bytes == 0 {
        return Err(ConfigError::Invalid(
            "storage.upload_chunk_bytes cannot be 0".into(),
        ));
    }

    if config.storage.fetch_probe_bytes == 0 {
        return Err(ConfigError::Invalid(
            "storage.fetch_probe_bytes cannot be 0".into(),
        ));
    }

    // The cellular threshold must be the stricter of the two.
    if config.playback.ready_threshold_cellular_ms <= config.playback.ready_threshold_default_ms {
        return Err(ConfigError::Invalid(
            "playback.ready_threshold_cellular_ms must exceed ready_threshold_default_ms".into(),
        ));
    }

    if config.playback.load_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "playback.load_timeout_ms cannot be 0".into(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid("retry.max_attempts cannot be 0".into()));
    }

    if config.compression.bitrate == 0 {
        return Err(ConfigError::Invalid("compression.bitrate cannot be 0".into()));
    }

    Ok(())
}
