//! GeminiClient - handles communication with the Gemini and Veo REST APIs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::credentials::{CredentialSource, EnvCredentials, StaticCredentials};
use super::error::{GeminiError, ENTITY_NOT_FOUND_MESSAGE};
use super::poll::{parse_retry_after, PollPolicy};
use super::prompt::{
    build_request, truncate_video_prompt, video_prompt, DEFAULT_VIDEO_PROMPT_MAX_CHARS,
};
use crate::content::{GeneratedContent, InputData, VideoScript};

/// Default base URL for the Gemini API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for content generation.
pub const DEFAULT_CONTENT_MODEL: &str = "gemini-3-flash-preview";

/// Default model for video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default timeout for HTTP requests. Long articles take a while to write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP status code for rate limiting.
const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// HTTP status code for a missing model or resource.
const HTTP_STATUS_NOT_FOUND: u16 = 404;

/// Fixed output configuration for preview videos.
const VIDEO_SAMPLE_COUNT: u32 = 1;
const VIDEO_RESOLUTION: &str = "720p";
const VIDEO_ASPECT_RATIO: &str = "9:16";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// A long-running video operation as returned by submit and status calls.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoOperation {
    /// Resource name used to poll, e.g. `models/veo/operations/abc`.
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    error: Option<ApiErrorStatus>,
    #[serde(default)]
    response: Option<VideoOperationResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoOperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<VideoRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoRef {
    #[serde(default)]
    uri: Option<String>,
}

impl VideoOperation {
    /// Outcome of a finished operation: the video URI or the failure.
    pub fn outcome(&self) -> Result<String, GeminiError> {
        if let Some(error) = &self.error {
            if error.message.contains(ENTITY_NOT_FOUND_MESSAGE) {
                return Err(GeminiError::EntityNotFound(error.message.clone()));
            }
            return Err(GeminiError::VideoFailed(error.message.clone()));
        }
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .and_then(|r| r.generated_samples.first())
            .and_then(|s| s.video.as_ref())
            .and_then(|v| v.uri.clone())
            .ok_or(GeminiError::MissingVideoUri)
    }
}

/// Remove an optional Markdown code fence around a JSON payload.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_start_matches("```");
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// Parse the model's text answer into a validated content bundle.
pub fn parse_generated_content(raw: &str) -> Result<GeneratedContent, GeminiError> {
    let json = strip_code_fence(raw);
    let content: GeneratedContent =
        serde_json::from_str(json).map_err(|e| GeminiError::ResponseParse(e.to_string()))?;
    content
        .validate()
        .map_err(|e| GeminiError::ResponseParse(e.to_string()))?;
    Ok(content)
}

/// Append the access key so the media URI can be fetched directly.
pub fn playable_url(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", uri, separator, api_key)
}

/// Turn a non-success response into the matching error variant.
async fn error_from_response(response: reqwest::Response) -> GeminiError {
    let status = response.status().as_u16();
    let retry_after_secs = parse_retry_after(&response);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body, None),
    };

    if status == HTTP_STATUS_TOO_MANY_REQUESTS {
        log::warn!(
            "Rate limited by Gemini API. Retry-After: {:?} seconds",
            retry_after_secs
        );
        return GeminiError::RateLimit {
            message,
            retry_after_secs,
        };
    }

    if status == HTTP_STATUS_NOT_FOUND
        || api_status.as_deref() == Some("NOT_FOUND")
        || message.contains(ENTITY_NOT_FOUND_MESSAGE)
    {
        return GeminiError::EntityNotFound(message);
    }

    GeminiError::ApiError { status, message }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, GeminiError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()?)
}

/// Client for the Gemini content and Veo video endpoints.
pub struct GeminiClient {
    credentials: Arc<dyn CredentialSource>,
    api_key: RwLock<String>,
    base_url: String,
    content_model: String,
    video_model: String,
    poll_policy: PollPolicy,
    video_prompt_max_chars: usize,
    http_client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new GeminiClient by reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::MissingApiKey` if neither `GEMINI_API_KEY` nor
    /// `API_KEY` is set.
    pub fn new() -> Result<Self, GeminiError> {
        Self::with_credentials(Arc::new(EnvCredentials))
    }

    /// Create a new GeminiClient with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, GeminiError> {
        Self::with_credentials(Arc::new(StaticCredentials::new(api_key)))
    }

    /// Create a new GeminiClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, GeminiError> {
        Ok(Self::with_api_key(api_key)?.with_endpoint(base_url))
    }

    /// Create a client that asks `credentials` for its key, now and on re-acquisition.
    pub fn with_credentials(credentials: Arc<dyn CredentialSource>) -> Result<Self, GeminiError> {
        let api_key = credentials.acquire()?;

        Ok(Self {
            credentials,
            api_key: RwLock::new(api_key),
            base_url: GEMINI_API_BASE_URL.to_string(),
            content_model: DEFAULT_CONTENT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_policy: PollPolicy::default(),
            video_prompt_max_chars: DEFAULT_VIDEO_PROMPT_MAX_CHARS,
            http_client: build_http_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Replace the base URL. A trailing slash is dropped.
    pub fn with_endpoint(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_content_model(mut self, model: String) -> Self {
        self.content_model = model;
        self
    }

    pub fn with_video_model(mut self, model: String) -> Self {
        self.video_model = model;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn with_video_prompt_max_chars(mut self, max_chars: usize) -> Self {
        self.video_prompt_max_chars = max_chars;
        self
    }

    /// Rebuild the HTTP client with a different request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GeminiError> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    /// Get the API key currently in use.
    pub fn api_key(&self) -> String {
        self.api_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn content_model(&self) -> &str {
        &self.content_model
    }

    pub fn video_model(&self) -> &str {
        &self.video_model
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// Ask the credential source for a fresh key and use it from now on.
    pub fn reacquire_credentials(&self) -> Result<(), GeminiError> {
        let key = self.credentials.acquire()?;
        *self
            .api_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = key;
        log::info!("Re-acquired API credentials");
        Ok(())
    }

    /// Generate the full content bundle for one input.
    ///
    /// Makes a single request; there are no retries.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::InvalidInput` for unusable input,
    /// `GeminiError::ContentBlocked` if the prompt was refused,
    /// `GeminiError::EmptyResponse` if the model answered without text,
    /// `GeminiError::ResponseParse` if the answer does not match the schema,
    /// or an HTTP/API error for transport failures.
    pub async fn generate_content(&self, input: &InputData) -> Result<GeneratedContent, GeminiError> {
        let request = build_request(input)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.content_model
        );

        log::info!(
            "Requesting content from {} (image: {})",
            self.content_model,
            input.has_image()
        );

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = error_from_response(response).await;
            log::error!("Content generation failed: {}", error);
            return Err(error);
        }

        let body: GenerateContentResponse = response.json().await?;

        let text = match body.text() {
            Some(text) => text,
            None => {
                if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
                    log::warn!("Prompt blocked: {}", reason);
                    return Err(GeminiError::ContentBlocked { reason });
                }
                return Err(GeminiError::EmptyResponse);
            }
        };

        let content = parse_generated_content(&text)?;
        log::info!(
            "Content generated ({} article characters)",
            content.long_article.chars().count()
        );
        Ok(content)
    }

    /// Submit a video generation job.
    pub async fn submit_video(&self, prompt: &str) -> Result<VideoOperation, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.video_model
        );

        let body = serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": VIDEO_SAMPLE_COUNT,
                "resolution": VIDEO_RESOLUTION,
                "aspectRatio": VIDEO_ASPECT_RATIO,
            },
        });

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    /// Fetch the current state of a video operation.
    pub async fn poll_video(&self, operation_name: &str) -> Result<VideoOperation, GeminiError> {
        let url = format!("{}/v1beta/{}", self.base_url, operation_name);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    /// One submit-and-poll sequence.
    async fn run_video_job(&self, prompt: &str) -> Result<String, GeminiError> {
        let mut operation = self.submit_video(prompt).await?;
        log::info!("Video job submitted: {}", operation.name);

        let mut attempts = 0u32;
        while !operation.done {
            if attempts >= self.poll_policy.max_attempts {
                log::error!("Video job {} timed out after {} checks", operation.name, attempts);
                return Err(GeminiError::PollTimeout { attempts });
            }
            tokio::time::sleep(self.poll_policy.interval).await;
            operation = self.poll_video(&operation.name).await?;
            attempts += 1;
            log::debug!("Video job {} check {}: done={}", operation.name, attempts, operation.done);
        }

        operation.outcome()
    }

    /// Generate a preview video and return a playable URL.
    ///
    /// The returned URL carries the access key. Use
    /// [`GeminiClient::generate_video_uri`] for a URI that is safe to store.
    pub async fn generate_video(&self, prompt: &str) -> Result<String, GeminiError> {
        let uri = self.generate_video_uri(prompt).await?;
        Ok(self.playable(&uri))
    }

    /// Generate a preview video and return the bare media URI.
    ///
    /// The prompt is truncated to the configured prefix length. If the
    /// provider reports the requested entity as missing, credentials are
    /// re-acquired and the whole sequence is retried exactly once.
    pub async fn generate_video_uri(&self, prompt: &str) -> Result<String, GeminiError> {
        let prompt = truncate_video_prompt(prompt, self.video_prompt_max_chars);
        if prompt.trim().is_empty() {
            return Err(GeminiError::VideoFailed("empty video prompt".to_string()));
        }

        match self.run_video_job(&prompt).await {
            Err(e) if e.is_entity_not_found() => {
                log::warn!("{}; re-acquiring credentials and retrying once", e);
                self.reacquire_credentials()?;
                self.run_video_job(&prompt).await
            }
            other => other,
        }
    }

    /// Generate the preview video for a script's hook and visual cues.
    ///
    /// Returns the bare media URI; see [`GeminiClient::playable`].
    pub async fn generate_video_for_script(&self, script: &VideoScript) -> Result<String, GeminiError> {
        self.generate_video_uri(&video_prompt(script)).await
    }

    /// Media URI with the current access key appended.
    pub fn playable(&self, uri: &str) -> String {
        playable_url(uri, &self.api_key())
    }

    /// Download a video file to disk.
    ///
    /// Takes the bare media URI and authenticates with the key header.
    /// Streams the download to disk without loading the full video into memory.
    pub async fn download_video(&self, uri: &str, dest: &Path) -> Result<PathBuf, GeminiError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .http_client
            .get(uri)
            .header(API_KEY_HEADER, self.api_key())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(dest.to_path_buf())
    }
}
