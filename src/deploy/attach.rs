// ABOUTME: Attaches to the container's output before start and forwards it to the host.
// ABOUTME: A background task routes each frame to the stdout or stderr sink it belongs to.

use super::error::DeployError;
use crate::runtime::{AttachError, AttachOps, AttachOptions, OutputChannel, OutputStream};
use crate::types::ContainerId;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Where container output is written.
pub struct OutputSinks {
    pub stdout: Sink,
    pub stderr: Sink,
}

impl OutputSinks {
    pub fn new(
        stdout: impl AsyncWrite + Send + Unpin + 'static,
        stderr: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        }
    }

    /// The host process's own stdout and stderr.
    pub fn inherit() -> Self {
        Self::new(tokio::io::stdout(), tokio::io::stderr())
    }
}

/// Handle on the background forwarder.
#[derive(Debug)]
pub struct AttachedOutput {
    task: JoinHandle<Result<u64, AttachError>>,
}

impl AttachedOutput {
    /// Wait until the container closes its output. Returns the number of
    /// bytes forwarded.
    pub async fn wait(&mut self) -> Result<u64, AttachError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(AttachError::StreamError(format!("output forwarder died: {e}"))),
        }
    }

    /// Stop forwarding without waiting for the container.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Open the container's live stdout/stderr stream and start forwarding it.
pub async fn attach<R: AttachOps>(
    runtime: &R,
    id: &ContainerId,
    sinks: OutputSinks,
) -> Result<AttachedOutput, DeployError> {
    let stream = runtime
        .attach_container(id, &AttachOptions::output())
        .await
        .map_err(DeployError::Attach)?;

    let container = id.short().to_string();
    let task = tokio::spawn(async move {
        let result = forward(stream, sinks).await;
        match &result {
            Ok(bytes) => tracing::debug!(container = %container, bytes, "container output closed"),
            Err(e) => tracing::warn!(container = %container, error = %e, "container output failed"),
        }
        result
    });

    tracing::info!(container = %id.short(), "attached to container output");
    Ok(AttachedOutput { task })
}

/// Route frames to their sinks until the stream ends.
pub(crate) async fn forward(
    mut stream: OutputStream,
    mut sinks: OutputSinks,
) -> Result<u64, AttachError> {
    let mut forwarded = 0u64;

    while let Some(frame) = stream.next().await {
        let frame = frame?;
        let sink = match frame.channel {
            OutputChannel::Stdout => &mut sinks.stdout,
            OutputChannel::Stderr => &mut sinks.stderr,
        };
        sink.write_all(&frame.data).await?;
        sink.flush().await?;
        forwarded += frame.data.len() as u64;
    }

    sinks.stdout.shutdown().await?;
    sinks.stderr.shutdown().await?;
    Ok(forwarded)
}
