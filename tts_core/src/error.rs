use thiserror::Error;

/// Failure kinds of the synthesis core.
///
/// The set is closed on purpose: transports translate each kind to their own
/// status codes in one place.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The model could not be loaded.
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    /// No speaker of the model matches the requested id.
    #[error("Unknown speaker: {requested}. Available: {}", .available.join(", "))]
    UnknownSpeaker {
        requested: String,
        available: Vec<String>,
    },

    /// Anything that went wrong between chunking and encoding.
    #[error("TTS generation failed: {0}")]
    Synthesis(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    pub fn synthesis(msg: impl std::fmt::Display) -> Self {
        Self::Synthesis(msg.to_string())
    }

    pub fn model_unavailable(msg: impl std::fmt::Display) -> Self {
        Self::ModelUnavailable(msg.to_string())
    }
}
