// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerSpec, HostBindings, progress records and output frames.

use crate::types::ContainerPort;
use bytes::Bytes;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Static configuration of a container to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image to run, named exactly as it should be reported back.
    pub image: String,
    /// Ports exposed without host bindings.
    pub exposed_ports: BTreeSet<ContainerPort>,
    /// `KEY=VALUE` entries; `None` leaves the field out of the request.
    pub env: Option<Vec<String>>,
    /// Command to run.
    pub cmd: Vec<String>,
    /// Host-side configuration; engines that only accept it at creation
    /// take it from here.
    pub host: HostBindings,
}

/// Port bindings and bind mounts applied to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBindings {
    /// Container port to the single host port it is published on.
    pub port_bindings: BTreeMap<ContainerPort, u16>,
    /// `host:container` bind mounts.
    pub binds: Vec<String>,
}

impl HostBindings {
    pub fn is_empty(&self) -> bool {
        self.port_bindings.is_empty() && self.binds.is_empty()
    }
}

/// Which channels to attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOptions {
    pub stream: bool,
    pub stdout: bool,
    pub stderr: bool,
}

impl AttachOptions {
    /// Live stdout and stderr, no stdin, no past logs.
    pub fn output() -> Self {
        Self {
            stream: true,
            stdout: true,
            stderr: true,
        }
    }
}

/// Output channel a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

/// One demultiplexed chunk of container output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    pub channel: OutputChannel,
    pub data: Bytes,
}

/// A fragment of a build or pull progress stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressChunk {
    /// A record the engine client already decoded.
    Record(ProgressRecord),
    /// Raw fragment text the engine client handed over undecoded.
    Raw(Bytes),
}

/// One JSON message of the engine's build/pull stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressRecord {
    /// Build output text.
    #[serde(default)]
    pub stream: Option<String>,
    /// Pull status text.
    #[serde(default)]
    pub status: Option<String>,
    /// Progress bar text accompanying `status`.
    #[serde(default)]
    pub progress: Option<String>,
    /// Layer or image id the status refers to.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
    /// Result id of a finished build.
    #[serde(default)]
    pub aux: Option<AuxId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuxId {
    #[serde(default, rename = "ID")]
    pub id: Option<String>,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    /// Runtime version.
    pub version: String,
    /// API version.
    pub api_version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}
