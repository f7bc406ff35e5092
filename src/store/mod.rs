use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Sites used when the list document is missing or unreadable.
pub const DEFAULT_SITES: [&str; 10] = [
    "https://agimobadrimmobilier.com",
    "https://agimobadrimmobilier.ma",
    "https://ceg.ma",
    "https://elysiumdinnershow.ma",
    "https://hrk.ma",
    "https://kapture.ma",
    "https://la-villa.ma",
    "https://manaosavis.ma",
    "https://startjobs.ma",
    "https://topanimation.ma",
];

pub const DEFAULT_SITES_FILE: &str = "websites.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize site list: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write site list to '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Where the list returned by `load_with_source` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    File,
    NotFound,
    ParseError,
}

/// Persists the ordered site list as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct SiteListStore {
    path: PathBuf,
    defaults: Vec<String>,
}

impl SiteListStore {
    pub fn new(path: impl Into<PathBuf>, defaults: Vec<String>) -> Self {
        SiteListStore {
            path: path.into(),
            defaults,
        }
    }

    pub fn with_builtin_defaults(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DEFAULT_SITES.iter().map(|s| s.to_string()).collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// Loads the list, falling back to the defaults on a missing or corrupt document.
    pub fn load(&self) -> Vec<String> {
        self.load_with_source().0
    }

    pub fn load_with_source(&self) -> (Vec<String>, LoadSource) {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    log::info!("No site list at {}, using defaults", self.path.display());
                } else {
                    log::warn!("Cannot read {}: {}, using defaults", self.path.display(), e);
                }
                return (self.defaults.clone(), LoadSource::NotFound);
            }
        };

        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(sites) => (sites, LoadSource::File),
            Err(e) => {
                log::warn!("Corrupt site list {}: {}, using defaults", self.path.display(), e);
                (self.defaults.clone(), LoadSource::ParseError)
            }
        }
    }

    /// Replaces the document atomically: a sibling temp file is written, then renamed.
    pub fn save(&self, sites: &[String]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(sites)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| {
            log::error!("Error saving websites to {}: {}", self.path.display(), source);
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        log::info!("Saved {} sites to {}", sites.len(), self.path.display());
        Ok(())
    }
}

/// Writes `contents` to a temp file next to `path` and renames it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Advisory check shown to the operator; the store itself accepts anything.
pub fn looks_valid(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.contains('.')
}

/// Splits one-URL-per-line text into a site list, trimming and skipping blank lines.
pub fn parse_site_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// How many entries pass `looks_valid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvisoryCounts {
    pub valid: usize,
    pub invalid: usize,
}

impl AdvisoryCounts {
    pub fn of(sites: &[String]) -> Self {
        let valid = sites.iter().filter(|site| looks_valid(site)).count();
        AdvisoryCounts {
            valid,
            invalid: sites.len() - valid,
        }
    }
}
