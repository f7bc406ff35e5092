use std::io;
use std::time::{Duration, Instant};

use reqwest::{Client, redirect};

use super::prelude::*;
use super::report;

/// User agent sent with every probe.
pub const USER_AGENT: &str = "Website Status Checker 1.0";

const MAX_REDIRECTS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;

/// Prepends `https://` when the URL carries no `http://`/`https://` scheme.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

pub(crate) fn truncate_description(description: &str) -> String {
    description.chars().take(MAX_ERROR_CHARS).collect()
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

/// True if any error in the chain is a rustls failure, either directly or
/// boxed inside an `io::Error` by the TLS stream.
fn is_tls_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err
                .get_ref()
                .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some())
            {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Connection resets, refusals and peers that hang up before answering.
fn is_connection_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// A configured HTTP client that turns every request into a `ProbeOutcome`.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    timeout_seconds: u64,
}

impl Prober {
    /// Builds the client: whole-request timeout, redirects followed, certificate
    /// verification disabled.
    pub fn new(timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .use_rustls_tls()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Prober {
            client,
            timeout_seconds,
        })
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Probes a single URL. Never fails; every error becomes a category.
    pub async fn check(&self, url: &str) -> ProbeOutcome {
        let url = normalize_url(url);

        let start = Instant::now();
        let outcome = match self.client.get(&url).send().await {
            Ok(resp) => {
                let code = resp.status().as_u16();
                // The already-received status still classifies if the body breaks off.
                if let Err(e) = resp.bytes().await {
                    log::debug!("Body of {url} not fully read: {}", report(&e));
                }
                ProbeOutcome::from_status(&url, code, round_ms(elapsed_ms(start)))
            }
            Err(e) => self.classify_error(&url, &e, elapsed_ms(start)),
        };

        log::debug!(
            "Probed {}: {} in {:.2}ms",
            outcome.url,
            outcome.display_label(),
            outcome.response_time_ms
        );
        outcome
    }

    /// First match wins: TLS, timeout, connection, anything else.
    fn classify_error(&self, url: &str, err: &reqwest::Error, elapsed_ms: f64) -> ProbeOutcome {
        if is_tls_failure(err) {
            ProbeOutcome::failure(url, Category::SSLError, elapsed_ms)
        } else if err.is_timeout() {
            // Reported as the configured budget, not the measured time.
            ProbeOutcome::failure(url, Category::Timeout, self.timeout_seconds as f64 * 1000.0)
        } else if err.is_connect() || is_connection_failure(err) {
            ProbeOutcome::failure(url, Category::ConnectionFailed, elapsed_ms)
        } else {
            ProbeOutcome::other_error(url, truncate_description(&report(err)), elapsed_ms)
        }
    }
}

/// Probes one URL with a freshly built client.
pub async fn check_one(url: &str, timeout_seconds: u64) -> ProbeOutcome {
    match Prober::new(timeout_seconds) {
        Ok(prober) => prober.check(url).await,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", report(&e));
            ProbeOutcome::other_error(normalize_url(url), truncate_description(&report(&e)), 0.0)
        }
    }
}
