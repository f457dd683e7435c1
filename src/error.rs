//! Error types for Pouch

use thiserror::Error;

/// Result type for Pouch operations
pub type Result<T> = std::result::Result<T, PouchError>;

/// Pouch error types
#[derive(Error, Debug)]
pub enum PouchError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid value for --{flag}: {reason}")]
    InvalidFlag { flag: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The daemon answered with a non-success status. `message` is the
    /// daemon's own text, surfaced verbatim.
    #[error("{message}")]
    Daemon { status: u16, message: String },

    #[error("cannot reach daemon at {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("failed to create container: {0}")]
    CreateContainer(Box<PouchError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PouchError {
    /// Shorthand for a flag value that failed to parse
    pub fn invalid_flag(flag: &'static str, reason: impl Into<String>) -> Self {
        PouchError::InvalidFlag {
            flag,
            reason: reason.into(),
        }
    }

    /// Whether the error was detected before the daemon was contacted
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PouchError::InvalidArgument(_) | PouchError::InvalidFlag { .. } | PouchError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_error_prefix() {
        let err = PouchError::CreateContainer(Box::new(PouchError::Daemon {
            status: 404,
            message: "image not found".to_string(),
        }));
        assert_eq!(err.to_string(), "failed to create container: image not found");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_invalid_flag_names_flag() {
        let err = PouchError::invalid_flag("device-read-bps", "bad format");
        assert_eq!(err.to_string(), "invalid value for --device-read-bps: bad format");
        assert!(err.is_input_error());
    }
}
