use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `filter` when given, then `RUST_LOG`, then falls back
/// to `info`. Later calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let filter = filter
            .and_then(|f| EnvFilter::try_new(f).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();

        match installed {
            Ok(()) => tracing::debug!("logging initialized"),
            Err(e) => eprintln!("Failed to install the logger: {e}"),
        }
    });
}
