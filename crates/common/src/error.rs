//! Error types shared across EVM crates.

/// Top-level error type for EVM operations.
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    /// A parameter is out of range, or incompatible with the frame size.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The frame sequence itself cannot be processed (size changes, too short).
    #[error("Degenerate input: {message}")]
    DegenerateInput { message: String },

    /// The run was stopped by the caller between frames.
    #[error("Run cancelled after {frames_processed} frame(s)")]
    Cancelled { frames_processed: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using EvmError.
pub type EvmResult<T> = Result<T, EvmError>;

impl EvmError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: msg.into(),
        }
    }

    pub fn degenerate_input(msg: impl Into<String>) -> Self {
        Self::DegenerateInput {
            message: msg.into(),
        }
    }

    pub fn cancelled(frames_processed: u64) -> Self {
        Self::Cancelled { frames_processed }
    }

    /// Whether the error reflects a bad parameter set rather than bad frames.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = EvmError::invalid_config("levels must be >= 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: levels must be >= 1"
        );
        assert!(err.is_configuration());

        let err = EvmError::cancelled(3);
        assert_eq!(err.to_string(), "Run cancelled after 3 frame(s)");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> EvmResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(EvmError::Io(_))));
    }
}
