// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Container handles, image references, target names and container ports.

mod id;
mod image_ref;
mod port;
mod target_name;

pub use id::{ContainerId, ImageId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use port::{ContainerPort, ParsePortError, Protocol};
pub use target_name::{TargetName, TargetNameError};
