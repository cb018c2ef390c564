// ABOUTME: The deployment target name, used as image tag and container filter key.
// ABOUTME: Validated once so every stage can use the raw string verbatim.

use super::image_ref::{ImageRef, ParseImageRefError};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetNameError {
    #[error("target name cannot be empty")]
    Empty,

    #[error("target name must not contain a digest: {0}")]
    HasDigest(String),

    #[error("invalid target name: {0}")]
    Invalid(#[from] ParseImageRefError),
}

/// Name the image is tagged with and the key stale containers are matched by.
///
/// The original string is kept as given: the engine reports a container's
/// image exactly as it was named at creation, so the reaper compares against
/// the same text the factory used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetName {
    raw: String,
    reference: ImageRef,
}

impl TargetName {
    pub fn new(value: &str) -> Result<Self, TargetNameError> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(TargetNameError::Empty);
        }

        let reference = ImageRef::parse(raw)?;
        if reference.digest().is_some() {
            return Err(TargetNameError::HasDigest(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            reference,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Repository part, e.g. `app` for `app:test`.
    pub fn repository(&self) -> String {
        self.reference.repository()
    }

    /// Tag part, `latest` when the name carries none.
    pub fn tag(&self) -> &str {
        self.reference.tag().unwrap_or("latest")
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
