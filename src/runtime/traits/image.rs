// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Build from an archived context, pull from a registry, and tag.

use super::sealed::Sealed;
use super::shared_types::ProgressChunk;
use crate::types::{ImageRef, TargetName};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Progress reported by the engine while an image is built or pulled.
///
/// The stream ends when the engine finishes; an `Err` item is a transport
/// failure, not an error message reported by the build itself. The stream
/// may borrow the runtime that opened it.
pub type ProgressStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ProgressChunk, ImageError>> + Send + 'a>>;

/// Image operations: build, pull, tag.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Submit a tar archive of a build context, tagging the result as `tag`.
    async fn build_image<'a>(
        &'a self,
        context: Bytes,
        tag: &TargetName,
    ) -> Result<ProgressStream<'a>, ImageError>;

    /// Pull an image from its registry.
    async fn pull_image<'a>(
        &'a self,
        reference: &ImageRef,
    ) -> Result<ProgressStream<'a>, ImageError>;

    /// Give a local image an additional name.
    async fn tag_image(&self, source: &ImageRef, target: &TargetName) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("tag failed: {0}")]
    TagFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
