//! Observability and logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes tracing for binaries and local tooling.
///
/// Respects `RUST_LOG` when set; defaults to debug-level output for this
/// crate otherwise. Calling it twice is an error, so binaries call it exactly
/// once at startup.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_crm_intel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
