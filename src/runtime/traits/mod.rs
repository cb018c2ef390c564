// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps, ContainerOps, AttachOps and RuntimeInfo.

mod attach;
mod container;
mod image;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use attach::{AttachError, AttachOps, OutputStream};
pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use image::{ImageError, ImageOps, ProgressStream};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;
