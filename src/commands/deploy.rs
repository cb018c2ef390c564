// ABOUTME: Deploy command implementation.
// ABOUTME: Wires cancellation to Ctrl-C and the timeout, runs the pipeline, then streams output.

use super::runtime_connection::connect_to_runtime;
use dockapp::config::DeployConfig;
use dockapp::deploy::{DeployError, OutputSinks};
use dockapp::error::Result;
use dockapp::output::Output;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Deploy to the local engine.
pub async fn deploy(config: DeployConfig, detach: bool, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Deploying {} from {}", config.name, config.image));

    let runtime = connect_to_runtime(&config.runtime, &output).await?;

    let cancel = CancellationToken::new();
    let watcher = cancel_on_interrupt(cancel.clone(), config.timeout);
    let result = dockapp::deploy::deploy(&runtime, &config, OutputSinks::inherit(), cancel).await;
    watcher.abort();
    let deployed = result?;

    // Emit collected warnings
    for warning in deployed.diagnostics.warnings() {
        output.warning(&warning.message);
    }

    output.success(&format!(
        "Started container {} from {}",
        deployed.container.short(),
        config.name
    ));

    let mut attached = deployed.output;
    if detach {
        attached.abort();
        return Ok(());
    }

    tokio::select! {
        result = attached.wait() => {
            result.map_err(DeployError::Attach)?;
            output.progress("Container output closed");
        }
        _ = tokio::signal::ctrl_c() => {
            attached.abort();
            output.progress("Detached; the container keeps running");
        }
    }

    Ok(())
}

/// Cancel `token` on Ctrl-C or once `timeout` elapses.
fn cancel_on_interrupt(token: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::warn!("interrupted"),
            _ = deadline => tracing::warn!(timeout = ?timeout, "deployment timed out"),
        }
        token.cancel();
    })
}
