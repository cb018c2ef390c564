// ABOUTME: Application-wide error types for dockapp.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::config::ConfigError;
use crate::deploy::{DeployError, DeployErrorKind};
use crate::runtime::{RuntimeError, RuntimeErrorKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AlreadyExists(_) | Error::ConfigNotFound(_) | Error::Config(_) => 2,
            Error::Yaml(_) => 2,
            Error::Runtime(e) => match e.kind() {
                RuntimeErrorKind::NoRuntimeFound | RuntimeErrorKind::UnsupportedHost => 3,
                _ => 4,
            },
            Error::Deploy(e) => match e.kind() {
                DeployErrorKind::Config => 2,
                DeployErrorKind::Cancelled => 130,
                _ => 1,
            },
            Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
