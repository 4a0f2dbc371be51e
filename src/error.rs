use thiserror::Error;

/// Errors from the generative-model collaborator.
///
/// Only `Timeout` is ever retried, and only once; every other kind
/// propagates immediately so an unavailable model is not hammered.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The model is not reachable or not ready to serve requests
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The collaborator did not answer within the configured bound
    #[error("Generation timed out")]
    Timeout,

    /// The collaborator answered with something that is not the
    /// requested structured value
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// Anything the other kinds do not cover
    #[error("Generation failed: {0}")]
    Unknown(String),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout)
    }
}

/// Errors from the translation collaborator.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Transport-level failure reaching the collaborator
    #[error("Translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator reported a failure of its own
    #[error("Translation backend error: {0}")]
    Backend(String),

    /// The collaborator broke the one-line-in, one-line-out contract.
    /// Partial translations are never usable downstream.
    #[error("Translated {actual} lines, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors from the settings persistence collaborator.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Failed to read or write the settings record
    #[error("Settings store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record does not decode as settings
    #[error("Failed to decode settings: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The failure a run stopped at, tagged with its stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Translation stage failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Generation stage failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Top-level error for the embedding surface (builder, config,
/// convenience functions). Stage failures inside a run are reported
/// through `RunOutcome`, not through this enum.
#[derive(Error, Debug)]
pub enum MenuError {
    /// Translation collaborator failure
    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    /// Generation collaborator failure
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Settings persistence failure
    #[error("Profile store error: {0}")]
    Profile(#[from] ProfileError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Builder misuse
    #[error("Builder error: {0}")]
    Builder(String),
}

impl From<StageError> for MenuError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Translation(e) => MenuError::Translation(e),
            StageError::Generation(e) => MenuError::Generation(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_kind() {
        let err = GenerationError::Timeout;
        assert!(err.is_timeout());
        assert!(!GenerationError::Unknown("boom".to_string()).is_timeout());
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = TranslationError::LengthMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Translated 2 lines, expected 3");
    }

    #[test]
    fn test_stage_error_converts_to_menu_error() {
        let err: StageError = GenerationError::Unknown("boom".to_string()).into();
        let menu_err: MenuError = err.into();
        assert!(matches!(menu_err, MenuError::Generation(_)));
    }
}
