//! Logging utilities for vendor-api-harness
//!
//! Re-exports tracing macros with log_* naming convention for consistency,
//! and installs the subscriber used by test suites.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros with log_* naming
#[allow(unused_imports)]
pub use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    trace as log_trace,
    warn as log_warn,
};

static INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a compact fmt subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]. Safe to call
/// from every test; only the first call installs anything. If another
/// subscriber is already registered the call is a no-op.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .compact(),
            )
            .try_init();
    });
}
