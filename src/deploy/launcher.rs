// ABOUTME: Starts the created container and computes its host bindings.
// ABOUTME: Port bindings map container ports to host ports; buildDir is mounted at /root.

use super::error::DeployError;
use crate::config::{BUILD_DIR_TARGET, DeployConfig};
use crate::runtime::{ContainerOps, HostBindings};
use crate::types::ContainerId;

/// One host port per configured container port, plus the `buildDir` mount.
pub fn host_bindings(config: &DeployConfig) -> HostBindings {
    HostBindings {
        port_bindings: config.port_bind.clone(),
        binds: config
            .build_dir
            .iter()
            .map(|dir| format!("{}:{}", dir.display(), BUILD_DIR_TARGET))
            .collect(),
    }
}

/// Start the container. Success is the absence of an engine error.
pub async fn start_container<R: ContainerOps>(
    runtime: &R,
    id: &ContainerId,
    config: &DeployConfig,
) -> Result<(), DeployError> {
    let host = host_bindings(config);
    runtime
        .start_container(id, &host)
        .await
        .map_err(DeployError::Start)?;

    tracing::info!(container = %id.short(), image = %config.name, "container started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerPort, TargetName};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn config() -> DeployConfig {
        DeployConfig::new(TargetName::new("app:test").unwrap())
    }

    #[test]
    fn no_bindings_by_default() {
        assert!(host_bindings(&config()).is_empty());
    }

    #[test]
    fn build_dir_is_mounted_at_root() {
        let mut config = config();
        config.build_dir = Some(PathBuf::from("out"));
        assert_eq!(host_bindings(&config).binds, vec!["out:/root"]);
    }

    #[test]
    fn port_bindings_are_kept_per_port() {
        let mut config = config();
        config.port_bind = BTreeMap::from([
            (ContainerPort::tcp(8080), 9090),
            (ContainerPort::tcp(3000), 3000),
        ]);
        let bindings = host_bindings(&config);
        assert_eq!(bindings.port_bindings.get(&ContainerPort::tcp(8080)), Some(&9090));
        assert_eq!(bindings.port_bindings.len(), 2);
    }
}
