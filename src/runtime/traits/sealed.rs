// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Only runtime types inside this crate may implement the capability traits,
/// so methods can be added to them without a breaking release.
pub trait Sealed {}
