// ABOUTME: Container engine access for Docker and Podman.
// ABOUTME: Capability traits, the bollard-backed runtime, and local socket detection.

mod bollard;
mod detection;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    AttachError, AttachOps, AttachOptions, ContainerError, ContainerFilters, ContainerOps,
    ContainerSpec, ContainerSummary, HostBindings, ImageError, ImageOps, OutputChannel,
    OutputFrame, OutputStream, ProgressChunk, ProgressRecord, ProgressStream,
    RuntimeInfo as RuntimeInfoTrait, RuntimeInfoError, RuntimeMetadata,
};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};

/// Connect to the local engine, honouring an explicit runtime override.
pub fn connect_local(config: &RuntimeConfig) -> Result<BollardRuntime, RuntimeError> {
    let info = detect_local(config)?;
    tracing::debug!(runtime = %info.runtime_type, socket = %info.socket_path, "connecting to runtime");
    Ok(BollardRuntime::connect(&info)?)
}
