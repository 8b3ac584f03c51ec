//! Subscriber setup shared by unit and integration tests.

use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Installs a subscriber on the test writer once per process.
/// `RUST_LOG` wins; otherwise stagetree logs at debug.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stagetree=debug"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
        if installed.is_ok() {
            tracing::debug!("test subscriber installed");
        }
    });
}
