// ABOUTME: Error types for the deployment pipeline.
// ABOUTME: One variant per failing stage, carrying the engine's error verbatim.

use super::stage::StageKind;
use crate::config::ConfigError;
use crate::runtime::{AttachError, ContainerError, ImageError};
use crate::types::ContainerId;
use std::fmt;
use std::path::PathBuf;

/// Errors that end a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Configuration rejected before any engine call.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Listing containers failed.
    #[error("failed to list containers: {0}")]
    Query(#[source] ContainerError),

    /// One or more stale containers could not be removed.
    #[error("{0}")]
    Removal(RemovalFailures),

    #[error("failed to build image: {0}")]
    ImageBuild(#[source] ImageError),

    #[error("failed to pull image: {0}")]
    ImagePull(#[source] ImageError),

    /// The build context could not be packaged.
    #[error("failed to archive build context {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create container: {0}")]
    Create(#[source] ContainerError),

    #[error("failed to attach to container: {0}")]
    Attach(#[source] AttachError),

    #[error("failed to start container: {0}")]
    Start(#[source] ContainerError),

    /// Interrupted by the user or the configured timeout.
    #[error("deployment cancelled during {stage} stage")]
    Cancelled { stage: StageKind },

    /// A stage expected a container handle that no earlier stage produced.
    #[error("{stage} stage has no container handle")]
    MissingHandle { stage: StageKind },
}

/// Coarse category of a [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Config,
    Query,
    Removal,
    ImageBuild,
    ImagePull,
    Create,
    Attach,
    Start,
    Cancelled,
    Internal,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Config(_) => DeployErrorKind::Config,
            DeployError::Query(_) => DeployErrorKind::Query,
            DeployError::Removal(_) => DeployErrorKind::Removal,
            DeployError::ImageBuild(_) | DeployError::Archive { .. } => {
                DeployErrorKind::ImageBuild
            }
            DeployError::ImagePull(_) => DeployErrorKind::ImagePull,
            DeployError::Create(_) => DeployErrorKind::Create,
            DeployError::Attach(_) => DeployErrorKind::Attach,
            DeployError::Start(_) => DeployErrorKind::Start,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
            DeployError::MissingHandle { .. } => DeployErrorKind::Internal,
        }
    }
}

/// A container the reaper failed to remove.
#[derive(Debug)]
pub struct RemovalFailure {
    pub id: ContainerId,
    pub error: ContainerError,
}

/// Every removal failure of one reap, in listing order.
#[derive(Debug)]
pub struct RemovalFailures {
    failures: Vec<RemovalFailure>,
}

impl RemovalFailures {
    pub fn new(failures: Vec<RemovalFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[RemovalFailure] {
        &self.failures
    }
}

impl fmt::Display for RemovalFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to remove {} container(s)", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, failure.id.short(), failure.error)?;
        }
        Ok(())
    }
}
