// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// Unified runtime error for detection and connection failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// DOCKER_HOST points at something other than a unix socket.
    UnsupportedHost,
    /// Failed to connect to runtime socket.
    ConnectionFailed,
    /// Runtime operation error.
    RuntimeOperation,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
                DetectionError::UnsupportedHost(_) => RuntimeErrorKind::UnsupportedHost,
            },
            RuntimeError::Connection { source } => match source {
                RuntimeInfoError::ConnectionFailed(_) => RuntimeErrorKind::ConnectionFailed,
                RuntimeInfoError::Runtime(_) => RuntimeErrorKind::RuntimeOperation,
            },
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_detection_errors() {
        let err = RuntimeError::from(DetectionError::NoRuntimeFound);
        assert_eq!(err.kind(), RuntimeErrorKind::NoRuntimeFound);

        let err = RuntimeError::from(DetectionError::UnsupportedHost("tcp://x:2375".into()));
        assert_eq!(err.kind(), RuntimeErrorKind::UnsupportedHost);
    }

    #[test]
    fn kind_maps_connection_errors() {
        let err = RuntimeError::from(RuntimeInfoError::ConnectionFailed("refused".into()));
        assert_eq!(err.kind(), RuntimeErrorKind::ConnectionFailed);
        assert!(err.to_string().contains("refused"));
    }
}
