// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Detects the socket, reports what was found, and checks the engine answers.

use dockapp::error::Result;
use dockapp::output::Output;
use dockapp::runtime::{
    BollardRuntime, RuntimeConfig, RuntimeError, RuntimeInfoTrait, detect_local,
};

/// Connect to the local container runtime.
///
/// This handles the common pattern of:
/// 1. Detecting the runtime type and socket path
/// 2. Outputting progress messages
/// 3. Establishing the connection and pinging the engine
pub async fn connect_to_runtime(config: &RuntimeConfig, output: &Output) -> Result<BollardRuntime> {
    output.progress("  → Detecting runtime...");
    let runtime_info = detect_local(config).map_err(RuntimeError::from)?;

    output.progress(&format!(
        "  → Found {} at {}",
        runtime_info.runtime_type, runtime_info.socket_path
    ));

    let runtime = BollardRuntime::connect(&runtime_info).map_err(RuntimeError::from)?;
    runtime.ping().await.map_err(RuntimeError::from)?;

    Ok(runtime)
}
