// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Keeps container handles and image ids from being passed for one another.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum ContainerMarker {}
pub enum ImageMarker {}

/// An engine-issued identifier tagged with the kind of object it names.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// First twelve characters, the form `docker ps` prints.
    pub fn short(&self) -> &str {
        let end = self
            .value
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len());
        &self.value[..end]
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual impls: T is only a marker, so derives would wrongly require T: Trait.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Handle to a container owned by the engine.
pub type ContainerId = Id<ContainerMarker>;
/// Content id of a built image, as reported by the build stream.
pub type ImageId = Id<ImageMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_truncates_long_ids() {
        let id = ContainerId::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");
    }

    #[test]
    fn short_keeps_short_ids() {
        let id = ContainerId::new("abc");
        assert_eq!(id.short(), "abc");
    }
}
