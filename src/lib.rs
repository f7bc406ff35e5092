pub mod config;
pub mod http_probe;
pub mod logging;
pub mod report;
pub mod store;
pub mod watch;
