// ABOUTME: Errors raised while merging and validating deployment configuration.
// ABOUTME: Always surfaced before the first engine call.

use crate::types::{ParsePortError, TargetNameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidName(#[from] TargetNameError),

    #[error("image source cannot be empty")]
    EmptyImage,

    #[error("command cannot be empty")]
    EmptyCommand,

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid port: {0}")]
    InvalidPort(#[from] ParsePortError),

    #[error("invalid environment entry {0:?} (expected KEY=VALUE)")]
    InvalidEnvEntry(String),

    #[error("invalid port binding {0:?} (expected CONTAINER=HOST, e.g. 8080/tcp=9090)")]
    InvalidBinding(String),
}
