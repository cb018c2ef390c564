// ABOUTME: In-memory engine that records every call, for pipeline tests.
// ABOUTME: Progress, output frames and failures are scripted per test.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    AttachError, AttachOps, AttachOptions, ContainerError, ContainerFilters, ContainerOps,
    ContainerSpec, ContainerSummary, HostBindings, ImageError, ImageOps, OutputFrame,
    OutputStream, ProgressChunk, ProgressStream, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::types::{ContainerId, ImageRef, TargetName};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;

/// A call the engine received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List { all: bool },
    Remove { id: String, force: bool },
    Build { tag: String },
    Pull { reference: String },
    Tag { source: String, target: String },
    Create(ContainerSpec),
    Attach { id: String, opts: AttachOptions },
    Start { id: String, host: HostBindings },
}

impl Call {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Call::List { .. } => "list",
            Call::Remove { .. } => "remove",
            Call::Build { .. } => "build",
            Call::Pull { .. } => "pull",
            Call::Tag { .. } => "tag",
            Call::Create(_) => "create",
            Call::Attach { .. } => "attach",
            Call::Start { .. } => "start",
        }
    }
}

/// One scripted item of a build or pull stream.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Chunk(ProgressChunk),
    Fail(String),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    containers: Vec<ContainerSummary>,
    next_id: u64,
    progress: Vec<Scripted>,
    stall_progress: bool,
    output: Vec<OutputFrame>,
    build_context: Option<Bytes>,
    fail_list: Option<String>,
    fail_remove: HashSet<String>,
    fail_build: Option<String>,
    fail_pull: Option<String>,
    fail_create: Option<String>,
    fail_attach: Option<String>,
    fail_start: Option<String>,
}

#[derive(Default)]
pub(crate) struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed an existing container.
    pub(crate) fn with_container(self, id: &str, image: &str, state: &str) -> Self {
        self.state.lock().containers.push(ContainerSummary {
            id: ContainerId::new(id),
            name: format!("seeded-{}", id),
            image: image.to_string(),
            state: state.to_string(),
        });
        self
    }

    pub(crate) fn with_progress(self, items: Vec<Scripted>) -> Self {
        self.state.lock().progress = items;
        self
    }

    /// Keep the build/pull stream open after the scripted items.
    pub(crate) fn stalling_progress(self) -> Self {
        self.state.lock().stall_progress = true;
        self
    }

    pub(crate) fn with_output(self, frames: Vec<OutputFrame>) -> Self {
        self.state.lock().output = frames;
        self
    }

    pub(crate) fn failing_list(self, message: &str) -> Self {
        self.state.lock().fail_list = Some(message.to_string());
        self
    }

    pub(crate) fn failing_remove(self, id: &str) -> Self {
        self.state.lock().fail_remove.insert(id.to_string());
        self
    }

    pub(crate) fn failing_build(self, message: &str) -> Self {
        self.state.lock().fail_build = Some(message.to_string());
        self
    }

    pub(crate) fn failing_pull(self, message: &str) -> Self {
        self.state.lock().fail_pull = Some(message.to_string());
        self
    }

    pub(crate) fn failing_create(self, message: &str) -> Self {
        self.state.lock().fail_create = Some(message.to_string());
        self
    }

    pub(crate) fn failing_attach(self, message: &str) -> Self {
        self.state.lock().fail_attach = Some(message.to_string());
        self
    }

    pub(crate) fn failing_start(self, message: &str) -> Self {
        self.state.lock().fail_start = Some(message.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn call_names(&self) -> Vec<&'static str> {
        self.state.lock().calls.iter().map(Call::name).collect()
    }

    pub(crate) fn containers(&self) -> Vec<ContainerSummary> {
        self.state.lock().containers.clone()
    }

    /// The last archive submitted to `build_image`.
    pub(crate) fn build_context(&self) -> Option<Bytes> {
        self.state.lock().build_context.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn progress_stream(&self) -> ProgressStream<'static> {
        let state = self.state.lock();
        let items: Vec<Result<ProgressChunk, ImageError>> = state
            .progress
            .iter()
            .map(|item| match item {
                Scripted::Chunk(chunk) => Ok(chunk.clone()),
                Scripted::Fail(message) => Err(ImageError::Runtime(message.clone())),
            })
            .collect();

        if state.stall_progress {
            let open = stream::pending::<Result<ProgressChunk, ImageError>>();
            Box::pin(stream::iter(items).chain(open))
        } else {
            Box::pin(stream::iter(items))
        }
    }
}

impl Sealed for FakeEngine {}

#[async_trait]
impl RuntimeInfo for FakeEngine {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        Ok(RuntimeMetadata {
            name: "Fake".to_string(),
            version: "0".to_string(),
            api_version: "0".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        Ok(())
    }
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn build_image<'a>(
        &'a self,
        context: Bytes,
        tag: &TargetName,
    ) -> Result<ProgressStream<'a>, ImageError> {
        self.record(Call::Build {
            tag: tag.to_string(),
        });
        let fail = {
            let mut state = self.state.lock();
            state.build_context = Some(context);
            state.fail_build.clone()
        };
        if let Some(message) = fail {
            return Err(ImageError::BuildFailed(message));
        }
        Ok(self.progress_stream())
    }

    async fn pull_image<'a>(
        &'a self,
        reference: &ImageRef,
    ) -> Result<ProgressStream<'a>, ImageError> {
        self.record(Call::Pull {
            reference: reference.to_string(),
        });
        if let Some(message) = self.state.lock().fail_pull.clone() {
            return Err(ImageError::PullFailed(message));
        }
        Ok(self.progress_stream())
    }

    async fn tag_image(&self, source: &ImageRef, target: &TargetName) -> Result<(), ImageError> {
        self.record(Call::Tag {
            source: source.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.record(Call::List { all: filters.all });
        let state = self.state.lock();
        if let Some(message) = &state.fail_list {
            return Err(ContainerError::Runtime(message.clone()));
        }
        Ok(state
            .containers
            .iter()
            .filter(|c| filters.all || c.state == "running")
            .cloned()
            .collect())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        self.record(Call::Remove {
            id: id.to_string(),
            force,
        });
        let mut state = self.state.lock();
        if state.fail_remove.contains(id.as_str()) {
            return Err(ContainerError::RemovalInProgress(id.to_string()));
        }
        let before = state.containers.len();
        state.containers.retain(|c| &c.id != id);
        if state.containers.len() == before {
            return Err(ContainerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        self.record(Call::Create(spec.clone()));
        let mut state = self.state.lock();
        if let Some(message) = &state.fail_create {
            return Err(ContainerError::InvalidConfig(message.clone()));
        }
        state.next_id += 1;
        let n = state.next_id;
        let id = ContainerId::new(format!("{:064x}", n));
        state.containers.push(ContainerSummary {
            id: id.clone(),
            name: format!("created-{}", n),
            image: spec.image.clone(),
            state: "created".to_string(),
        });
        Ok(id)
    }

    async fn start_container(
        &self,
        id: &ContainerId,
        host: &HostBindings,
    ) -> Result<(), ContainerError> {
        self.record(Call::Start {
            id: id.to_string(),
            host: host.clone(),
        });
        let mut state = self.state.lock();
        if let Some(message) = &state.fail_start {
            return Err(ContainerError::Runtime(message.clone()));
        }
        match state.containers.iter_mut().find(|c| &c.id == id) {
            Some(container) => {
                container.state = "running".to_string();
                Ok(())
            }
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl AttachOps for FakeEngine {
    async fn attach_container(
        &self,
        id: &ContainerId,
        opts: &AttachOptions,
    ) -> Result<OutputStream, AttachError> {
        self.record(Call::Attach {
            id: id.to_string(),
            opts: *opts,
        });
        let state = self.state.lock();
        if let Some(message) = &state.fail_attach {
            return Err(AttachError::Runtime(message.clone()));
        }
        if !state.containers.iter().any(|c| &c.id == id) {
            return Err(AttachError::ContainerNotFound(id.to_string()));
        }
        let frames: Vec<Result<OutputFrame, AttachError>> =
            state.output.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(frames)))
    }
}
