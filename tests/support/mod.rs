// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and local runtime discovery for integration tests.

use dockapp::runtime::{BollardRuntime, RuntimeConfig, connect_local};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("dockapp=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Local runtime, or `None` when no Docker/Podman socket is available.
#[allow(dead_code)]
pub fn local_runtime() -> Option<BollardRuntime> {
    connect_local(&RuntimeConfig::default()).ok()
}
