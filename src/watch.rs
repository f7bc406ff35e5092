use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

/// Returns a receiver that flips to `true` on Ctrl-C.
/// The handler is installed right away, so an interrupt during a batch is not lost.
pub fn interrupt_signal() -> watch::Receiver<bool> {
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(true);
            }
            Err(e) => log::warn!("Cannot listen for Ctrl-C: {e}"),
        }
        // keep the sender alive so `changed()` never reports a closed channel
        std::future::pending::<()>().await;
    });
    stop_rx
}

/// Runs `batch`, sleeps `interval`, repeats until `stop` turns `true`.
/// A running batch is never interrupted. Returns the number of batches run.
pub async fn run_until_stopped<F, Fut>(
    interval: Duration,
    mut stop: watch::Receiver<bool>,
    mut batch: F,
) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut batches = 0;
    loop {
        batch().await;
        batches += 1;

        if *stop.borrow_and_update() {
            break;
        }

        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = sleep(interval) => {}
        }
    }
    log::info!("Interrupted, stopping after {batches} batches");
    batches
}
