// src/logging/mod.rs

pub mod banner_log;
pub mod event_log;

pub use banner_log::{BannerEventKind, BannerLog};
pub use event_log::EventLog;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Installs the global subscriber: JSON lines into an hourly rolling file,
/// filtered by `RUST_LOG` (default `info`).
///
/// Keep the returned guard alive for as long as logs should be written.
pub fn init_tracing(log_dir: &str, file_name: &str) -> Result<WorkerGuard, String> {
    let log_file = rolling::hourly(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("unable to set global tracing subscriber: {}", e))?;
    Ok(guard)
}
