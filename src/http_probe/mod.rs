pub mod pool;
pub mod probe;
pub mod result;

use std::fmt::Write;

pub mod prelude {
    pub use super::pool::{check_all, run_bounded, DEFAULT_MAX_CONCURRENCY};
    pub use super::probe::{check_one, normalize_url, Prober, USER_AGENT};
    pub use super::result::{Category, ProbeOutcome};
}

/// Flattens an error and its sources into a single line.
pub(crate) fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
