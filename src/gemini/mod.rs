//! Google Gemini integration.
//!
//! Content bundles come from a single `generateContent` call constrained to a
//! JSON schema. Preview videos come from a long-running Veo operation that is
//! submitted once and polled until done.

mod client;
mod credentials;
mod error;
mod poll;
mod prompt;
mod schema;

pub use client::{
    parse_generated_content, playable_url, strip_code_fence, GeminiClient, VideoOperation,
    DEFAULT_CONTENT_MODEL, DEFAULT_TIMEOUT, DEFAULT_VIDEO_MODEL, GEMINI_API_BASE_URL,
};
pub use credentials::{
    CredentialSource, EnvCredentials, StaticCredentials, API_KEY_ENV, GEMINI_API_KEY_ENV,
};
pub use error::{
    GeminiError, ENTITY_NOT_FOUND_MESSAGE, GENERATION_FAILED_MESSAGE, VIDEO_FAILED_MESSAGE,
};
pub use poll::{PollPolicy, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
pub use prompt::{
    build_request, instructions, truncate_video_prompt, video_prompt, GenerateContentRequest,
    GenerationConfig, InlineData, Part, RequestContent, DEFAULT_VIDEO_PROMPT_MAX_CHARS,
    IMAGE_PREFACE,
};
pub use schema::generated_content_schema;
