use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http_probe::result::{Category, ProbeOutcome};
use crate::store::write_atomic;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Coarse grouping used by the summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGroup {
    Online,
    Warning,
    Offline,
}

impl From<Category> for StatusGroup {
    fn from(category: Category) -> Self {
        match category {
            Category::Online => StatusGroup::Online,
            Category::Redirect | Category::UnknownStatus => StatusGroup::Warning,
            Category::ClientError
            | Category::ServerError
            | Category::SSLError
            | Category::Timeout
            | Category::ConnectionFailed
            | Category::OtherError => StatusGroup::Offline,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_sites: usize,
    pub online: usize,
    pub warnings: usize,
    pub offline: usize,
}

impl Summary {
    pub fn from_outcomes(results: &HashMap<String, ProbeOutcome>) -> Self {
        let mut summary = Summary {
            total_sites: results.len(),
            ..Default::default()
        };
        for outcome in results.values() {
            match StatusGroup::from(outcome.category) {
                StatusGroup::Online => summary.online += 1,
                StatusGroup::Warning => summary.warnings += 1,
                StatusGroup::Offline => summary.offline += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub status: String,
    pub response_time: f64,
    pub status_code: Option<u16>,
}

/// Export snapshot of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub details: BTreeMap<String, ReportEntry>,
}

impl Report {
    pub fn from_outcomes(results: &HashMap<String, ProbeOutcome>, timestamp: DateTime<Utc>) -> Self {
        let details = results
            .iter()
            .map(|(url, outcome)| {
                let entry = ReportEntry {
                    status: outcome.display_label(),
                    response_time: outcome.response_time_ms,
                    status_code: outcome.status_code,
                };
                (url.clone(), entry)
            })
            .collect();

        Report {
            timestamp,
            summary: Summary::from_outcomes(results),
            details,
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes()).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
