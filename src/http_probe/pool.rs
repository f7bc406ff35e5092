use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::prelude::*;
use super::probe::truncate_description;
use super::report;

/// Probes in flight at once when the operator doesn't choose.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Probes every URL with at most `max_concurrency` requests in flight and
/// waits for the whole batch. Keys are the literal input strings.
pub async fn check_all(
    urls: &[String],
    timeout_seconds: u64,
    max_concurrency: usize,
) -> HashMap<String, ProbeOutcome> {
    let prober = match Prober::new(timeout_seconds) {
        Ok(prober) => prober,
        Err(e) => {
            let description = truncate_description(&report(&e));
            log::error!("Failed to build HTTP client: {}", description);
            return urls
                .iter()
                .map(|url| {
                    let outcome = ProbeOutcome::other_error(normalize_url(url), &description, 0.0);
                    (url.clone(), outcome)
                })
                .collect();
        }
    };

    run_bounded(urls, max_concurrency, move |url| {
        let prober = prober.clone();
        async move { prober.check(&url).await }
    })
    .await
}

/// Runs `probe` once per distinct URL on a semaphore-bounded `JoinSet`.
///
/// A task that dies before returning (panic, cancellation) is reported as an
/// `OtherError` outcome with zero elapsed time so no key goes missing.
pub async fn run_bounded<F, Fut>(
    urls: &[String],
    max_concurrency: usize,
    probe: F,
) -> HashMap<String, ProbeOutcome>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ProbeOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let mut tasks = JoinSet::new();
    let mut expected: HashSet<&str> = HashSet::new();

    for url in urls {
        if !expected.insert(url.as_str()) {
            continue;
        }

        let semaphore = semaphore.clone();
        let key = url.clone();
        let fut = probe(url.clone());
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            (key, fut.await)
        });
    }

    let mut results = HashMap::with_capacity(expected.len());
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((key, outcome)) => {
                results.insert(key, outcome);
            }
            Err(e) => {
                log::warn!("Probe task failed: {}", e);
                failure.get_or_insert_with(|| truncate_description(&e.to_string()));
            }
        }
    }

    for url in expected {
        if !results.contains_key(url) {
            let description = failure.clone().unwrap_or_else(|| "probe task failed".to_string());
            results.insert(
                url.to_string(),
                ProbeOutcome::other_error(normalize_url(url), description, 0.0),
            );
        }
    }

    let failed = results
        .values()
        .filter(|outcome| outcome.category != Category::Online)
        .count();
    log::info!("Batch finished: {} sites, {} not online", results.len(), failed);

    results
}
