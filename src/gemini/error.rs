//! Errors for the Gemini content and video endpoints.

use crate::content::InputError;

/// Message shown to the user for any failed content generation.
pub const GENERATION_FAILED_MESSAGE: &str =
    "We couldn't generate that content. Please check your connection or try a different input.";

/// Message shown to the user when the preview video could not be produced.
pub const VIDEO_FAILED_MESSAGE: &str =
    "Video preview could not be generated. Try again in a moment.";

/// Provider message signalling a stale key or an unavailable model.
pub const ENTITY_NOT_FOUND_MESSAGE: &str = "Requested entity was not found";

/// Errors that can occur during Gemini operations.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not configured (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error message, or the raw body when it is not JSON
        message: String,
    },

    #[error("Rate limited: {message}")]
    RateLimit {
        /// Human-readable rate limit message
        message: String,
        /// Retry-After header value in seconds, if provided
        retry_after_secs: Option<u64>,
    },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Prompt blocked by content policy: {reason}")]
    ContentBlocked {
        /// Block reason reported in the prompt feedback
        reason: String,
    },

    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    #[error("Video generation failed: {0}")]
    VideoFailed(String),

    #[error("Video generation completed without a video URI")]
    MissingVideoUri,

    #[error("Video generation still running after {attempts} status checks")]
    PollTimeout {
        /// Number of status checks made before giving up
        attempts: u32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GeminiError {
    /// Whether this is the condition that warrants re-acquiring credentials.
    pub fn is_entity_not_found(&self) -> bool {
        matches!(self, GeminiError::EntityNotFound(_))
    }

    /// Generic text surfaced to the user when content generation fails.
    ///
    /// Input problems are reported as-is since the user can fix them.
    pub fn user_message(&self) -> String {
        match self {
            GeminiError::InvalidInput(e) => e.to_string(),
            GeminiError::MissingApiKey => self.to_string(),
            _ => GENERATION_FAILED_MESSAGE.to_string(),
        }
    }
}
