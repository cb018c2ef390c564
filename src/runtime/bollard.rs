// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible API.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    AttachError, AttachOps, AttachOptions, AuxId, ContainerError, ContainerFilters, ContainerOps,
    ContainerSpec, ContainerSummary, ErrorDetail, HostBindings, ImageError, ImageOps,
    OutputChannel, OutputFrame, OutputStream, ProgressChunk, ProgressRecord, ProgressStream,
    RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::runtime::types::RuntimeType;
use crate::types::{ContainerId, ImageRef, TargetName};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::models::{BuildInfo, ContainerCreateBody, CreateImageInfo, HostConfig, PortBinding};
use bollard::query_parameters::{
    AttachContainerOptions, BuildImageOptions, CreateContainerOptions, CreateImageOptions,
    ListContainersOptions, RemoveContainerOptions, StartContainerOptions, TagImageOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 400 => ContainerError::InvalidConfig(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_remove_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::RemovalInProgress(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_attach_error(e: bollard::errors::Error) -> AttachError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => AttachError::ContainerNotFound(message.clone()),
        _ => AttachError::Runtime(e.to_string()),
    }
}

fn map_tag_error(e: bollard::errors::Error, source: &ImageRef) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(source.to_string())
        }
        _ => ImageError::TagFailed(format!("{}: {}", source, e)),
    }
}

/// Classify a failed progress item.
///
/// An error message the engine reported inside the stream, or a fragment the
/// client could not decode, is still a progress fragment; everything else is a
/// transport failure that ends the stage.
fn progress_failure(e: bollard::errors::Error) -> Result<ProgressChunk, bollard::errors::Error> {
    match e {
        bollard::errors::Error::DockerStreamError { error } => {
            Ok(ProgressChunk::Record(ProgressRecord {
                error: Some(error),
                ..Default::default()
            }))
        }
        bollard::errors::Error::JsonDataError { message, .. } => {
            Ok(ProgressChunk::Raw(Bytes::from(message)))
        }
        e @ bollard::errors::Error::JsonSerdeError { .. } => {
            Ok(ProgressChunk::Raw(Bytes::from(e.to_string())))
        }
        e => Err(e),
    }
}

fn error_detail(detail: Option<bollard::models::ErrorDetail>) -> Option<ErrorDetail> {
    detail.map(|d| ErrorDetail {
        code: d.code,
        message: d.message,
    })
}

fn build_record(info: BuildInfo) -> ProgressRecord {
    ProgressRecord {
        stream: info.stream,
        status: info.status,
        id: info.id,
        error_detail: error_detail(info.error_detail),
        aux: info.aux.map(|aux| AuxId { id: aux.id }),
        ..Default::default()
    }
}

fn pull_record(info: CreateImageInfo) -> ProgressRecord {
    ProgressRecord {
        status: info.status,
        id: info.id,
        error_detail: error_detail(info.error_detail),
        ..Default::default()
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via the Docker-compatible API.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a container runtime using detected runtime info.
    pub fn connect(info: &super::types::RuntimeInfo) -> Result<Self, RuntimeInfoError> {
        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, info.runtime_type))
    }
}

// Implement Sealed trait to allow runtime trait implementations
impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn build_image<'a>(
        &'a self,
        context: Bytes,
        tag: &TargetName,
    ) -> Result<ProgressStream<'a>, ImageError> {
        let opts = BuildImageOptions {
            t: Some(tag.to_string()),
            rm: true,
            ..Default::default()
        };

        let stream = self
            .client
            .build_image(opts, None, Some(bollard::body_full(context)))
            .map(|item| {
                item.map(|info| ProgressChunk::Record(build_record(info)))
                    .or_else(progress_failure)
                    .map_err(|e| ImageError::BuildFailed(e.to_string()))
            });

        Ok(Box::pin(stream))
    }

    async fn pull_image<'a>(
        &'a self,
        reference: &ImageRef,
    ) -> Result<ProgressStream<'a>, ImageError> {
        let image_name = reference.to_string();
        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        let stream = self
            .client
            .create_image(Some(opts), None, None)
            .map(move |item| {
                item.map(|info| ProgressChunk::Record(pull_record(info)))
                    .or_else(progress_failure)
                    .map_err(|e| ImageError::PullFailed(format!("{}: {}", image_name, e)))
            });

        Ok(Box::pin(stream))
    }

    async fn tag_image(&self, source: &ImageRef, target: &TargetName) -> Result<(), ImageError> {
        let opts = TagImageOptions {
            repo: Some(target.repository()),
            tag: Some(target.tag().to_string()),
        };

        self.client
            .tag_image(&source.to_string(), Some(opts))
            .await
            .map_err(|e| map_tag_error(e, source))
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: filters.all,
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| ContainerSummary {
                            id: ContainerId::new(c.id.unwrap_or_default()),
                            name: c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default(),
                            image: c.image.unwrap_or_default(),
                            state: c
                                .state
                                .map(|s| format!("{:?}", s).to_lowercase())
                                .unwrap_or_default(),
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_remove_error)
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let exposed_ports: Vec<String> =
            spec.exposed_ports.iter().map(|p| p.to_string()).collect();

        // Engine API 1.24 removed host configuration from the start request,
        // so bindings travel with creation.
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = spec
            .host
            .port_bindings
            .iter()
            .map(|(port, host_port)| {
                (
                    port.to_string(),
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                )
            })
            .collect();

        let host_config = HostConfig {
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            binds: if spec.host.binds.is_empty() {
                None
            } else {
                Some(spec.host.binds.clone())
            },
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image.clone()),
            env: spec.env.clone(),
            cmd: if spec.cmd.is_empty() {
                None
            } else {
                Some(spec.cmd.clone())
            },
            exposed_ports: Some(exposed_ports),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(None::<CreateContainerOptions>, body)
            .await
            .map_err(map_container_create_error)?;

        for warning in &response.warnings {
            tracing::warn!(container = %response.id, "{}", warning);
        }

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(
        &self,
        id: &ContainerId,
        host: &HostBindings,
    ) -> Result<(), ContainerError> {
        if !host.is_empty() {
            tracing::debug!(
                container = %id.short(),
                ports = host.port_bindings.len(),
                binds = host.binds.len(),
                "host bindings were applied at creation"
            );
        }

        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }
}

#[async_trait]
impl AttachOps for BollardRuntime {
    async fn attach_container(
        &self,
        id: &ContainerId,
        opts: &AttachOptions,
    ) -> Result<OutputStream, AttachError> {
        let attach_opts = AttachContainerOptions {
            stream: opts.stream,
            stdout: opts.stdout,
            stderr: opts.stderr,
            ..Default::default()
        };

        let attached = self
            .client
            .attach_container(id.as_str(), Some(attach_opts))
            .await
            .map_err(map_attach_error)?;

        // bollard strips the 8-byte multiplexing headers; keep the channel tag.
        let frames = attached.output.filter_map(|item| async move {
            match item {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                    Some(Ok(OutputFrame {
                        channel: OutputChannel::Stdout,
                        data: message,
                    }))
                }
                Ok(LogOutput::StdErr { message }) => Some(Ok(OutputFrame {
                    channel: OutputChannel::Stderr,
                    data: message,
                })),
                Ok(LogOutput::StdIn { .. }) => None,
                Err(e) => Some(Err(AttachError::StreamError(e.to_string()))),
            }
        });

        Ok(Box::pin(frames))
    }
}
