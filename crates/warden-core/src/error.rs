//! Configuration errors

/// Errors produced while validating a [`crate::ScanConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The namespace scope marker is empty
    #[error("namespace scope marker must not be empty")]
    EmptyScopeMarker,

    /// A probe has no command to execute
    #[error("probe {0} has an empty command")]
    EmptyProbeCommand(String),

    /// The probe concurrency bound is zero
    #[error("max concurrent probes must be at least 1")]
    ZeroConcurrency,

    /// A label rule string is not of the form `key=value`
    #[error("invalid label rule: {0}")]
    InvalidLabelRule(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::EmptyScopeMarker;
        assert!(err.to_string().contains("scope marker"));

        let err = ConfigError::EmptyProbeCommand("agent".to_string());
        assert!(err.to_string().contains("agent"));
    }
}
