// ABOUTME: Runtime detection for the local system.
// ABOUTME: Honours explicit overrides and DOCKER_HOST, then probes Podman and Docker sockets.

use super::types::{RuntimeConfig, RuntimeInfo, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("unsupported DOCKER_HOST {0:?}: only unix:// sockets are supported")]
    UnsupportedHost(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect the container runtime on the local system.
///
/// Detection order:
/// 1. Explicit `runtime` / `socket` in `config`
/// 2. `DOCKER_HOST=unix://...`
/// 3. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 4. Rootful Podman socket (`/run/podman/podman.sock`)
/// 5. Docker socket (`/var/run/docker.sock`)
pub fn detect_local(config: &RuntimeConfig) -> Result<RuntimeInfo, DetectionError> {
    if let Some(info) = from_config(config) {
        return Ok(info);
    }

    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        let socket_path = host
            .strip_prefix("unix://")
            .ok_or_else(|| DetectionError::UnsupportedHost(host.clone()))?;
        return Ok(RuntimeInfo {
            runtime_type: guess_type(socket_path),
            socket_path: socket_path.to_string(),
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn from_config(config: &RuntimeConfig) -> Option<RuntimeInfo> {
    match (config.runtime, config.socket.as_deref()) {
        (Some(runtime_type), socket) => Some(RuntimeInfo {
            runtime_type,
            socket_path: socket
                .map(str::to_string)
                .unwrap_or_else(|| default_socket_path(runtime_type)),
        }),
        (None, Some(socket)) => Some(RuntimeInfo {
            runtime_type: guess_type(socket),
            socket_path: socket.to_string(),
        }),
        (None, None) => None,
    }
}

fn guess_type(socket_path: &str) -> RuntimeType {
    if socket_path.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    }
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
