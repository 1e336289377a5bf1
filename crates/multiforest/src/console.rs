//! Console logging for solver events.
//!
//! Solver crates only emit `tracing` events; this module installs a
//! formatting subscriber for binaries that want to see them.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "multiforest_solver=info,multiforest=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. A global
/// subscriber installed elsewhere is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init();
    });
}
