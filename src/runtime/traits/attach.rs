// ABOUTME: Attach operations trait for container runtimes.
// ABOUTME: Opens a container's live output stream, split into stdout and stderr frames.

use super::sealed::Sealed;
use super::shared_types::{AttachOptions, OutputFrame};
use crate::types::ContainerId;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Frames of container output in arrival order.
pub type OutputStream = Pin<Box<dyn Stream<Item = Result<OutputFrame, AttachError>> + Send>>;

/// Attach operations.
#[async_trait]
pub trait AttachOps: Sealed + Send + Sync {
    /// Attach to a container. Safe to call before start: output produced
    /// after the call is delivered from the first byte.
    async fn attach_container(
        &self,
        id: &ContainerId,
        opts: &AttachOptions,
    ) -> Result<OutputStream, AttachError>;
}

/// Errors from attach operations.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("failed to write container output: {0}")]
    Write(#[from] std::io::Error),

    #[error("runtime error: {0}")]
    Runtime(String),
}
