// ABOUTME: Library root for dockapp - exposes the pipeline and its supporting types.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod runtime;
pub mod types;
