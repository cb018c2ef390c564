// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: List, force-remove, create and start containers.

use super::sealed::Sealed;
use super::shared_types::{ContainerSpec, HostBindings};
use crate::types::ContainerId;
use async_trait::async_trait;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Remove a container. With `force` a running container is killed first.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// Create a container from the given spec without starting it.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;

    /// Start a created container with the given host bindings.
    async fn start_container(
        &self,
        id: &ContainerId,
        host: &HostBindings,
    ) -> Result<(), ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Include stopped containers.
    pub all: bool,
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name, without the leading slash.
    pub name: String,
    /// Image as named when the container was created.
    pub image: String,
    /// Current state (`running`, `exited`, ...).
    pub state: String,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("container removal already in progress: {0}")]
    RemovalInProgress(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
