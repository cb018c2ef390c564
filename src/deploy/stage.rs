// ABOUTME: Stage descriptors and the generic sequential stage runner.
// ABOUTME: Threads the container handle from the stage that creates it to those that need it.

use super::error::DeployError;
use crate::types::ContainerId;
use async_trait::async_trait;
use std::fmt;

/// The five deployment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Reap,
    ProvideImage,
    CreateContainer,
    Attach,
    Start,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Reap => "reap",
            StageKind::ProvideImage => "provide-image",
            StageKind::CreateContainer => "create-container",
            StageKind::Attach => "attach",
            StageKind::Start => "start",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage consumes besides the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageInput {
    Config,
    ConfigAndHandle,
}

/// What a stage hands to the stages after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutput {
    Nothing,
    Handle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub kind: StageKind,
    pub input: StageInput,
    pub output: StageOutput,
}

impl StageDescriptor {
    pub const fn new(kind: StageKind, input: StageInput, output: StageOutput) -> Self {
        Self {
            kind,
            input,
            output,
        }
    }
}

/// Reap before the image is provided, then create, attach and start in that
/// order. Attaching before start is what guarantees no output is lost.
pub const PIPELINE: [StageDescriptor; 5] = [
    StageDescriptor::new(StageKind::Reap, StageInput::Config, StageOutput::Nothing),
    StageDescriptor::new(
        StageKind::ProvideImage,
        StageInput::Config,
        StageOutput::Nothing,
    ),
    StageDescriptor::new(
        StageKind::CreateContainer,
        StageInput::Config,
        StageOutput::Handle,
    ),
    StageDescriptor::new(
        StageKind::Attach,
        StageInput::ConfigAndHandle,
        StageOutput::Handle,
    ),
    StageDescriptor::new(
        StageKind::Start,
        StageInput::ConfigAndHandle,
        StageOutput::Handle,
    ),
];

/// Runs one stage at a time on behalf of [`run_stages`].
#[async_trait]
pub trait StageExecutor: Send {
    /// Run `stage`. `handle` is present exactly when the stage declared
    /// [`StageInput::ConfigAndHandle`].
    async fn execute(
        &mut self,
        stage: StageKind,
        handle: Option<&ContainerId>,
    ) -> Result<Option<ContainerId>, DeployError>;
}

/// Run `stages` strictly in order, stopping at the first error.
///
/// Returns the last handle produced, if any stage produced one.
pub async fn run_stages<E: StageExecutor>(
    stages: &[StageDescriptor],
    executor: &mut E,
) -> Result<Option<ContainerId>, DeployError> {
    let mut handle: Option<ContainerId> = None;

    for stage in stages {
        let input = match stage.input {
            StageInput::Config => None,
            StageInput::ConfigAndHandle => Some(
                handle
                    .clone()
                    .ok_or(DeployError::MissingHandle { stage: stage.kind })?,
            ),
        };

        tracing::info!(stage = %stage.kind, "stage started");
        let produced = match executor.execute(stage.kind, input.as_ref()).await {
            Ok(produced) => produced,
            Err(e) => {
                tracing::error!(stage = %stage.kind, error = %e, "stage failed");
                return Err(e);
            }
        };

        if stage.output == StageOutput::Handle {
            handle = Some(produced.ok_or(DeployError::MissingHandle { stage: stage.kind })?);
        }
        tracing::debug!(stage = %stage.kind, "stage completed");
    }

    Ok(handle)
}
