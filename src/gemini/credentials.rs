//! API key sources.
//!
//! The client asks its [`CredentialSource`] for a key on construction and
//! again when the provider reports the key's target entity as missing.

use super::error::GeminiError;

/// Primary environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fallback environment variable.
pub const API_KEY_ENV: &str = "API_KEY";

/// Something that can hand out an API key, possibly a fresh one each time.
pub trait CredentialSource: Send + Sync {
    fn acquire(&self) -> Result<String, GeminiError>;
}

/// Reads the key from the environment, reloading `.env` on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn acquire(&self) -> Result<String, GeminiError> {
        // Missing .env is fine
        let _ = dotenv::dotenv();

        [GEMINI_API_KEY_ENV, API_KEY_ENV]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|key| !key.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)
    }
}

/// A fixed key, for callers that obtained it elsewhere.
#[derive(Debug, Clone)]
pub struct StaticCredentials(String);

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl CredentialSource for StaticCredentials {
    fn acquire(&self) -> Result<String, GeminiError> {
        if self.0.is_empty() {
            return Err(GeminiError::MissingApiKey);
        }
        Ok(self.0.clone())
    }
}
