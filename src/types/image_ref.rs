// ABOUTME: Registry image reference parsing and validation.
// ABOUTME: Handles nginx, nginx:tag, registry:port/org/image:tag@digest.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0:?}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

/// A parsed image reference. An absent tag and digest defaults the tag to
/// `latest`, matching what the engine pulls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !"/:.-_@".contains(*c))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) => (before, Some(after.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (without_digest, None),
        };

        if without_tag.is_empty() || tag.as_deref() == Some("") {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        let (registry, name) = split_registry(without_tag);

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Registry and name without tag or digest, the `repo` half of a tag request.
    pub fn repository(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }
}

/// The first path component is a registry when it looks like a host:
/// it contains a dot or a port, or is `localhost`.
fn split_registry(input: &str) -> (Option<String>, String) {
    match input.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (Some(first.to_string()), rest.to_string())
        }
        _ => (None, input.to_string()),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository())?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
