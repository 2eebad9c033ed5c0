//! Logging setup.
//!
//! Console logging is always on; when a log directory is configured a
//! daily-rolling file layer is added. The returned guard must be held for
//! the process lifetime so buffered file output flushes on shutdown.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::Result;

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "uplink=info,uplink_platforms=info,serenity=warn,sqlx=warn";

/// Initialize the tracing subscriber.
pub fn init_logging(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "uplink.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            registry.init();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_dependencies() {
        assert!(DEFAULT_LOG_FILTER.contains("uplink=info"));
        assert!(DEFAULT_LOG_FILTER.contains("serenity=warn"));
        assert!(DEFAULT_LOG_FILTER.contains("sqlx=warn"));
    }
}
