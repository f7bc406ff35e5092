use std::path::PathBuf;

use serde::Deserialize;

use crate::http_probe::pool::DEFAULT_MAX_CONCURRENCY;
use crate::store::DEFAULT_SITES_FILE;

/// Probe settings read from the YAML config file.
/// Every field is optional; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// JSON document holding the site list.
    #[serde(default = "default_sites_file")]
    pub sites_file: PathBuf,

    /// Whole-request timeout per probe, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum number of probes in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pause between batches in `watch` mode.
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    /// Where reports are written, if anywhere.
    #[serde(default)]
    pub report_file: Option<PathBuf>,

    /// Replaces the built-in fallback list when set.
    #[serde(default)]
    pub default_sites: Option<Vec<String>>,
}

fn default_sites_file() -> PathBuf {
    PathBuf::from(DEFAULT_SITES_FILE)
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_polling_interval_seconds() -> u64 {
    30
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            sites_file: default_sites_file(),
            timeout_seconds: default_timeout_seconds(),
            max_concurrency: default_max_concurrency(),
            polling_interval_seconds: default_polling_interval_seconds(),
            report_file: None,
            default_sites: None,
        }
    }
}
