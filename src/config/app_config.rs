use std::env;
use std::io;
use std::path::{Path, PathBuf};

use super::probe_config::ProbeConfig;
use crate::store::SiteListStore;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid YAML in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub struct AppConfig {
    pub config: ProbeConfig,
    /// The config file that was read, `None` when running on defaults.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// The site list store described by this configuration.
    pub fn store(&self) -> SiteListStore {
        match &self.config.default_sites {
            Some(defaults) => SiteListStore::new(&self.config.sites_file, defaults.clone()),
            None => SiteListStore::with_builtin_defaults(&self.config.sites_file),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let config = &self.config;
        if config.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("timeout_seconds must be at least 1".into()));
        }
        if config.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if config.polling_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "polling_interval_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Load the application configuration from a YAML file and environment variables.
/// `.env` is read first, then the file named by `CONFIG_FILE` (default `config.yml`).
/// `SITES_FILE` and `REPORT_FILE` override the corresponding settings.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let config_file_location =
        env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    load_config_with(Path::new(&config_file_location), |key| env::var(key).ok())
}

/// Same as `load_config`, with the file location and variable lookup supplied by the caller.
pub fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let (mut config, source) = match std::fs::read_to_string(path) {
        Ok(config_str) => {
            let config: ProbeConfig =
                serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            log::info!("Using config file: {}", path.display());
            (config, Some(path.to_path_buf()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No config file at {}, using defaults", path.display());
            (ProbeConfig::default(), None)
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if let Some(sites_file) = lookup("SITES_FILE") {
        config.sites_file = PathBuf::from(sites_file);
    }
    if let Some(report_file) = lookup("REPORT_FILE") {
        config.report_file = Some(PathBuf::from(report_file));
    }

    log::info!("Using site list: {}", config.sites_file.display());

    let app_config = AppConfig { config, source };
    app_config.validate()?;
    Ok(app_config)
}
