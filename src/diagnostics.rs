// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Record a warning the caller has already logged.
    pub fn record(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The engine reported an error inside a build or pull stream.
    pub fn progress_error(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ProgressError,
            message: message.into(),
        }
    }

    /// A build or pull stream fragment could not be decoded.
    pub fn malformed_progress(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MalformedProgress,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Error message inside an otherwise completed image stream.
    ProgressError,
    /// Undecodable image stream fragment, skipped.
    MalformedProgress,
}
