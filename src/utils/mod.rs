//! Utility modules

pub mod memory_storage;
pub mod validation;

pub use memory_storage::*;
pub use validation::*;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting this crate to `info`
///
/// Safe to call more than once; only the first call installs anything, and an
/// already-installed global subscriber is left alone.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cashbook_reconcile=info"));

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
