use std::fs;
use std::io::ErrorKind;
use tracing::{debug, error, info, warn};

use crate::types::client_config::{AppConfig, CameraBackend, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<AppConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!("Configuration file {} not found, using defaults", path);
            let config = AppConfig::default();
            validate_config(&config)?;
            Ok(config)
        }
        other => other,
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base_url = config.api.resolved_base_url();
    if base_url.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "api.base_url cannot be empty".into(),
        ));
    }

    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidConfig(format!(
            "api.base_url must start with http:// or https:// (got {})",
            base_url
        )));
    }

    if config.session.file.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "session.file cannot be empty".into(),
        ));
    }

    if config.camera.backend == CameraBackend::V4l && config.camera.zbarcam.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "camera.zbarcam must name the decoder program when backend = \"v4l\"".into(),
        ));
    }

    if config.paths.download_dir.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "paths.download_dir cannot be empty".into(),
        ));
    }

    Ok(())
}
