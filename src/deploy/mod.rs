// ABOUTME: The deployment pipeline: reap, provide image, create, attach, start.
// ABOUTME: Stages are declared as descriptors and executed by a generic sequential runner.

mod archive;
mod attach;
mod error;
mod factory;
mod image;
mod launcher;
mod pipeline;
mod progress;
mod reaper;
mod stage;


pub use archive::archive_context;
pub use attach::{AttachedOutput, OutputSinks, attach};
pub use error::{DeployError, DeployErrorKind, RemovalFailure, RemovalFailures};
pub use factory::{ALWAYS_EXPOSED, container_spec, create_container, env_entries, exposed_ports};
pub use image::{BUILD_RECIPE, ImageSource, ProvidedImage, provide_image};
pub use launcher::{host_bindings, start_container};
pub use pipeline::{Deployed, deploy};
pub use progress::{ProgressEvent, ProgressSummary, drain};
pub use reaper::{ReapReport, reap_containers};
pub use stage::{
    PIPELINE, StageDescriptor, StageExecutor, StageInput, StageKind, StageOutput, run_stages,
};
