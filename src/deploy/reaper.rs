// ABOUTME: Removes every container created from the target image before a redeploy.
// ABOUTME: Removals run concurrently and all failures are reported together.

use super::error::{DeployError, RemovalFailure, RemovalFailures};
use crate::runtime::{ContainerError, ContainerFilters, ContainerOps};
use crate::types::{ContainerId, TargetName};
use futures::future::join_all;

/// Containers the reaper removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: Vec<ContainerId>,
}

/// Force-remove all containers, running or stopped, whose image is exactly
/// the target name.
///
/// A container that disappears between listing and removal counts as
/// removed.
///
/// # Errors
///
/// `Query` if listing fails, `Removal` with every failed container otherwise.
pub async fn reap_containers<R: ContainerOps>(
    runtime: &R,
    target: &TargetName,
) -> Result<ReapReport, DeployError> {
    let containers = runtime
        .list_containers(&ContainerFilters { all: true })
        .await
        .map_err(DeployError::Query)?;

    let stale: Vec<ContainerId> = containers
        .into_iter()
        .filter(|c| c.image == target.as_str())
        .map(|c| {
            tracing::debug!(container = %c.id.short(), name = %c.name, state = %c.state, "stale container");
            c.id
        })
        .collect();

    if stale.is_empty() {
        tracing::info!(image = %target, "no containers to remove");
        return Ok(ReapReport::default());
    }

    let results = join_all(stale.into_iter().map(|id| async move {
        let result = runtime.remove_container(&id, true).await;
        (id, result)
    }))
    .await;

    let mut removed = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(()) | Err(ContainerError::NotFound(_)) => {
                tracing::info!(container = %id.short(), "removed container");
                removed.push(id);
            }
            Err(error) => failures.push(RemovalFailure { id, error }),
        }
    }

    if !failures.is_empty() {
        return Err(DeployError::Removal(RemovalFailures::new(failures)));
    }

    Ok(ReapReport { removed })
}
