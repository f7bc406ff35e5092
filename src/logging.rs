use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";

/// `--debug` forces `debug`; otherwise `RUST_LOG` if set, else `info`.
fn filter_directive(debug_flag: bool, rust_log: Option<String>) -> String {
    if debug_flag {
        "debug".to_string()
    } else {
        rust_log.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}

/// Installs the fmt subscriber. Records emitted through the `log` facade are bridged in.
pub fn init(debug_flag: bool) {
    let directive = filter_directive(debug_flag, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();

    log::debug!("Logging initialised with filter {directive}");
}
