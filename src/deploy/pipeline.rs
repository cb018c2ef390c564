// ABOUTME: Pipeline entry point: runs the five stages against one engine for one config.
// ABOUTME: Every stage is raced against a cancellation token.

use super::attach::{AttachedOutput, OutputSinks, attach};
use super::error::DeployError;
use super::factory::create_container;
use super::image::{ImageSource, ProvidedImage, provide_image};
use super::launcher::start_container;
use super::reaper::{ReapReport, reap_containers};
use super::stage::{PIPELINE, StageExecutor, StageKind, run_stages};
use crate::config::DeployConfig;
use crate::diagnostics::Diagnostics;
use crate::runtime::{AttachOps, ContainerOps, ImageOps};
use crate::types::ContainerId;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A started container and what it took to get there.
#[derive(Debug)]
pub struct Deployed {
    pub container: ContainerId,
    /// Forwarder still streaming the container's output.
    pub output: AttachedOutput,
    pub reaped: ReapReport,
    pub image: ProvidedImage,
    pub diagnostics: Diagnostics,
}

/// Deploy `config`: reap, provide the image, create, attach, start.
///
/// The configuration is validated and the image source resolved before the
/// first engine call, so a bad source never costs the running container. The
/// first failing stage ends the run; nothing is rolled back.
///
/// # Errors
///
/// `Config` or `ImagePull` for a source that cannot be used, the failing
/// stage's [`DeployError`], or `Cancelled` if `cancel` fires.
pub async fn deploy<R>(
    runtime: &R,
    config: &DeployConfig,
    sinks: OutputSinks,
    cancel: CancellationToken,
) -> Result<Deployed, DeployError>
where
    R: ImageOps + ContainerOps + AttachOps,
{
    config.validate()?;
    let source = ImageSource::resolve(&config.image)
        .await
        .map_err(DeployError::ImagePull)?;

    let mut deployer = Deployer {
        runtime,
        config,
        source,
        cancel,
        diagnostics: Diagnostics::default(),
        sinks: Some(sinks),
        reaped: None,
        image: None,
        output: None,
    };

    match run_stages(&PIPELINE, &mut deployer).await {
        Ok(handle) => deployer.finish(handle),
        Err(e) => {
            if let Some(output) = deployer.output.take() {
                output.abort();
            }
            Err(e)
        }
    }
}

/// Executes pipeline stages and keeps what each one produced.
struct Deployer<'a, R> {
    runtime: &'a R,
    config: &'a DeployConfig,
    source: ImageSource,
    cancel: CancellationToken,
    diagnostics: Diagnostics,
    sinks: Option<OutputSinks>,
    reaped: Option<ReapReport>,
    image: Option<ProvidedImage>,
    output: Option<AttachedOutput>,
}

impl<'a, R> Deployer<'a, R>
where
    R: ImageOps + ContainerOps + AttachOps,
{
    async fn run(
        &mut self,
        stage: StageKind,
        handle: Option<&ContainerId>,
    ) -> Result<Option<ContainerId>, DeployError> {
        match stage {
            StageKind::Reap => {
                self.reaped = Some(reap_containers(self.runtime, &self.config.name).await?);
                Ok(None)
            }
            StageKind::ProvideImage => {
                let image = provide_image(
                    self.runtime,
                    &self.source,
                    &self.config.name,
                    &mut self.diagnostics,
                )
                .await?;
                self.image = Some(image);
                Ok(None)
            }
            StageKind::CreateContainer => create_container(self.runtime, self.config)
                .await
                .map(Some),
            StageKind::Attach => {
                let id = handle.ok_or(DeployError::MissingHandle { stage })?;
                let sinks = self.sinks.take().unwrap_or_else(OutputSinks::inherit);
                self.output = Some(attach(self.runtime, id, sinks).await?);
                Ok(Some(id.clone()))
            }
            StageKind::Start => {
                let id = handle.ok_or(DeployError::MissingHandle { stage })?;
                start_container(self.runtime, id, self.config).await?;
                Ok(Some(id.clone()))
            }
        }
    }

    fn finish(self, handle: Option<ContainerId>) -> Result<Deployed, DeployError> {
        let container = handle.ok_or(DeployError::MissingHandle {
            stage: StageKind::Start,
        })?;
        let output = self.output.ok_or(DeployError::MissingHandle {
            stage: StageKind::Attach,
        })?;
        let image = self.image.ok_or(DeployError::MissingHandle {
            stage: StageKind::ProvideImage,
        })?;

        Ok(Deployed {
            container,
            output,
            reaped: self.reaped.unwrap_or_default(),
            image,
            diagnostics: self.diagnostics,
        })
    }
}

#[async_trait]
impl<'a, R> StageExecutor for Deployer<'a, R>
where
    R: ImageOps + ContainerOps + AttachOps,
{
    async fn execute(
        &mut self,
        stage: StageKind,
        handle: Option<&ContainerId>,
    ) -> Result<Option<ContainerId>, DeployError> {
        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(stage = %stage, "deployment cancelled");
                Err(DeployError::Cancelled { stage })
            }
            result = self.run(stage, handle) => result,
        }
    }
}
