// ABOUTME: Creates the container from the target image.
// ABOUTME: Exposed ports and environment are fixed in the container's static configuration.

use super::error::DeployError;
use super::launcher::host_bindings;
use crate::config::DeployConfig;
use crate::runtime::{ContainerOps, ContainerSpec};
use crate::types::{ContainerId, ContainerPort};
use std::collections::{BTreeMap, BTreeSet};

/// Ports every container exposes regardless of configuration.
pub const ALWAYS_EXPOSED: [ContainerPort; 2] = [ContainerPort::HTTP, ContainerPort::HTTPS];

/// 80/tcp, 443/tcp and every configured port, each once.
pub fn exposed_ports(ports: &[ContainerPort]) -> BTreeSet<ContainerPort> {
    ALWAYS_EXPOSED.iter().chain(ports).copied().collect()
}

/// `KEY=VALUE` entries, or `None` so an empty mapping is left out entirely.
pub fn env_entries(env: &BTreeMap<String, String>) -> Option<Vec<String>> {
    if env.is_empty() {
        return None;
    }
    Some(env.iter().map(|(k, v)| format!("{k}={v}")).collect())
}

pub fn container_spec(config: &DeployConfig) -> ContainerSpec {
    ContainerSpec {
        image: config.name.as_str().to_string(),
        exposed_ports: exposed_ports(&config.ports),
        env: env_entries(&config.env),
        cmd: config.command.clone(),
        host: host_bindings(config),
    }
}

/// Create, but do not start, a container from the target image.
pub async fn create_container<R: ContainerOps>(
    runtime: &R,
    config: &DeployConfig,
) -> Result<ContainerId, DeployError> {
    let spec = container_spec(config);
    tracing::debug!(
        image = %spec.image,
        ports = spec.exposed_ports.len(),
        env = spec.env.as_ref().map_or(0, Vec::len),
        "creating container"
    );

    let id = runtime
        .create_container(&spec)
        .await
        .map_err(DeployError::Create)?;

    tracing::info!(container = %id.short(), image = %spec.image, "container created");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Protocol, TargetName};
    use proptest::prelude::*;

    #[test]
    fn defaults_expose_http_and_https() {
        let ports: Vec<_> = exposed_ports(&[]).into_iter().collect();
        assert_eq!(ports, vec![ContainerPort::HTTP, ContainerPort::HTTPS]);
    }

    #[test]
    fn configured_port_is_added_once() {
        let ports = exposed_ports(&[ContainerPort::tcp(8080), ContainerPort::tcp(80)]);
        let rendered: Vec<_> = ports.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["80/tcp", "443/tcp", "8080/tcp"]);
    }

    #[test]
    fn empty_env_is_omitted() {
        assert_eq!(env_entries(&BTreeMap::new()), None);
    }

    #[test]
    fn env_becomes_key_value_entries() {
        let env = BTreeMap::from([
            ("FOO".to_string(), "bar".to_string()),
            ("EMPTY".to_string(), String::new()),
        ]);
        assert_eq!(
            env_entries(&env),
            Some(vec!["EMPTY=".to_string(), "FOO=bar".to_string()])
        );
    }

    #[test]
    fn spec_uses_target_name_as_image() {
        let mut config = DeployConfig::new(TargetName::new("app:test").unwrap());
        config.command = vec!["npm".to_string(), "start".to_string()];
        let spec = container_spec(&config);
        assert_eq!(spec.image, "app:test");
        assert_eq!(spec.cmd, vec!["npm", "start"]);
        assert_eq!(spec.env, None);
    }

    fn any_port() -> impl Strategy<Value = ContainerPort> {
        (
            1u16..=u16::MAX,
            prop_oneof![Just(Protocol::Tcp), Just(Protocol::Udp)],
        )
            .prop_map(|(number, protocol)| ContainerPort::new(number, protocol))
    }

    proptest! {
        #[test]
        fn exposed_set_always_has_defaults_and_every_port(
            ports in proptest::collection::vec(any_port(), 0..16)
        ) {
            let exposed = exposed_ports(&ports);
            prop_assert!(exposed.contains(&ContainerPort::HTTP));
            prop_assert!(exposed.contains(&ContainerPort::HTTPS));
            for port in &ports {
                prop_assert!(exposed.contains(port));
            }
            let distinct: BTreeSet<_> = ports.iter().chain(ALWAYS_EXPOSED.iter()).collect();
            prop_assert_eq!(exposed.len(), distinct.len());
        }
    }
}
