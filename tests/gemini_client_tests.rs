//! Mock HTTP tests for GeminiClient.
//!
//! These tests cover:
//! - Content request formatting (headers, parts, schema config)
//! - Response parsing and error mapping
//! - Video submit/poll, prompt truncation and the bounded poll loop
//! - Credential re-acquisition on "Requested entity was not found"

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use viral_engine::content::{InputData, Tone};
use viral_engine::gemini::{
    CredentialSource, GeminiClient, GeminiError, PollPolicy, GENERATION_FAILED_MESSAGE,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/generated_content.json");
const CONTENT_PATH: &str = "/v1beta/models/test-model:generateContent";
const SUBMIT_PATH: &str = "/v1beta/models/test-video:predictLongRunning";
const OPERATION_NAME: &str = "models/test-video/operations/op-1";
const OPERATION_PATH: &str = "/v1beta/models/test-video/operations/op-1";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url("test-api-key".to_string(), server.uri())
        .unwrap()
        .with_content_model("test-model".to_string())
        .with_video_model("test-video".to_string())
        .with_poll_policy(PollPolicy::new(Duration::from_millis(1), 3))
}

fn model_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
}

fn finished_operation(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "name": OPERATION_NAME,
        "done": true,
        "response": {
            "generateVideoResponse": {
                "generatedSamples": [{ "video": { "uri": uri } }]
            }
        }
    })
}

fn entity_not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(serde_json::json!({
        "error": {
            "code": 404,
            "message": "Requested entity was not found.",
            "status": "NOT_FOUND"
        }
    }))
}

/// JSON bodies of the POST requests; status polls are bodiless GETs.
async fn request_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

/// Hands out `key-0`, `key-1`, ... and counts how often it was asked.
struct CountingCredentials {
    calls: AtomicUsize,
}

impl CountingCredentials {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialSource for CountingCredentials {
    fn acquire(&self) -> Result<String, GeminiError> {
        Ok(format!("key-{}", self.calls.fetch_add(1, Ordering::SeqCst)))
    }
}

// === Content generation ===

#[tokio::test]
async fn test_text_only_request_has_no_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTENT_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(FIXTURE)))
        .expect(1)
        .mount(&server)
        .await;

    let content = client_for(&server)
        .generate_content(&InputData::text("AI is changing jobs"))
        .await
        .unwrap();
    assert_eq!(content.variations.get(Tone::Formal).twitter_thread.len(), 5);

    let bodies = request_bodies(&server).await;
    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(bodies[0]["contents"][0]["role"], "user");
    assert!(parts.iter().all(|p| p.get("inlineData").is_none()));
    assert!(parts[0]["text"]
        .as_str()
        .unwrap()
        .contains("SOURCE: \"AI is changing jobs\""));
    assert_eq!(
        bodies[0]["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(
        bodies[0]["generationConfig"]["responseSchema"]["required"][0],
        "variations"
    );
}

#[tokio::test]
async fn test_image_request_sends_inline_data_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(FIXTURE)))
        .mount(&server)
        .await;

    let input = InputData::with_image("", "aGVsbG8=", "image/jpeg");
    client_for(&server).generate_content(&input).await.unwrap();

    let bodies = request_bodies(&server).await;
    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
    assert!(parts[1]["text"].is_string());
}

#[tokio::test]
async fn test_fenced_response_is_accepted() {
    let server = MockServer::start().await;
    let fenced = format!("```json\n{}\n```", FIXTURE);
    Mock::given(method("POST"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(&fenced)))
        .mount(&server)
        .await;

    let content = client_for(&server)
        .generate_content(&InputData::text("topic"))
        .await
        .unwrap();
    assert_eq!(content.virality_score.trendiness, 90.0);
}

#[tokio::test]
async fn test_invalid_input_is_not_sent() {
    let server = MockServer::start().await;
    let input = InputData {
        text: "chart".to_string(),
        image: Some("aGVsbG8=".to_string()),
        mime_type: None,
    };

    let err = client_for(&server).generate_content(&input).await.unwrap_err();
    assert!(matches!(err, GeminiError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": { "code": 500, "message": "Internal error", "status": "INTERNAL" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_content(&InputData::text("topic"))
        .await
        .unwrap_err();
    match &err {
        GeminiError::ApiError { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Internal error");
        }
        other => panic!("Expected ApiError, got {:?}", other),
    }
    assert_eq!(err.user_message(), GENERATION_FAILED_MESSAGE);
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "30")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_content(&InputData::text("topic"))
        .await
        .unwrap_err();
    match err {
        GeminiError::RateLimit {
            message,
            retry_after_secs,
        } => {
            assert_eq!(message, "slow down");
            assert_eq!(retry_after_secs, Some(30));
        }
        other => panic!("Expected RateLimit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_content(&InputData::text("topic"))
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::ContentBlocked { ref reason } if reason == "SAFETY"));
}

#[tokio::test]
async fn test_empty_and_malformed_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(model_reply(r#"{"variations": {}}"#)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let input = InputData::text("topic");
    assert!(matches!(
        client.generate_content(&input).await,
        Err(GeminiError::EmptyResponse)
    ));
    assert!(matches!(
        client.generate_content(&input).await,
        Err(GeminiError::ResponseParse(_))
    ));
}

// === Video generation ===

#[tokio::test]
async fn test_video_submit_then_poll_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": OPERATION_NAME
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OPERATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": OPERATION_NAME,
            "done": false
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OPERATION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(finished_operation("https://files.test/video.mp4?alt=media")),
        )
        .mount(&server)
        .await;

    let url = client_for(&server)
        .generate_video("Vertical video. A robot at a desk.")
        .await
        .unwrap();
    assert_eq!(url, "https://files.test/video.mp4?alt=media&key=test-api-key");

    let requests = server.received_requests().await.unwrap();
    let polls = requests.iter().filter(|r| r.method.as_str() == "GET").count();
    assert_eq!(polls, 2);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["instances"][0]["prompt"], "Vertical video. A robot at a desk.");
    assert_eq!(bodies[0]["parameters"]["resolution"], "720p");
    assert_eq!(bodies[0]["parameters"]["aspectRatio"], "9:16");
    assert_eq!(bodies[0]["parameters"]["sampleCount"], 1);
}

#[tokio::test]
async fn test_video_prompt_is_truncated_to_300_chars() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(finished_operation("https://files.test/v")),
        )
        .mount(&server)
        .await;

    let prompt = "é".repeat(450);
    client_for(&server).generate_video(&prompt).await.unwrap();

    let bodies = request_bodies(&server).await;
    let sent = bodies[0]["instances"][0]["prompt"].as_str().unwrap();
    assert_eq!(sent.chars().count(), 300);
    assert!(prompt.starts_with(sent));
}

#[tokio::test]
async fn test_entity_not_found_reacquires_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(entity_not_found())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(header("x-goog-api-key", "key-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(finished_operation("https://files.test/v")),
        )
        .mount(&server)
        .await;

    let credentials = CountingCredentials::new();
    let client = GeminiClient::with_credentials(credentials.clone())
        .unwrap()
        .with_endpoint(server.uri())
        .with_video_model("test-video".to_string());
    assert_eq!(credentials.calls(), 1);

    let url = client.generate_video("a prompt").await.unwrap();
    assert_eq!(url, "https://files.test/v?key=key-1");
    assert_eq!(client.playable("https://files.test/v"), url);
    assert_eq!(credentials.calls(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_entity_not_found_twice_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(entity_not_found())
        .mount(&server)
        .await;

    let credentials = CountingCredentials::new();
    let client = GeminiClient::with_credentials(credentials.clone())
        .unwrap()
        .with_endpoint(server.uri())
        .with_video_model("test-video".to_string());

    let err = client.generate_video("a prompt").await.unwrap_err();
    assert!(err.is_entity_not_found());
    assert_eq!(credentials.calls(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_other_video_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
        .mount(&server)
        .await;

    let credentials = CountingCredentials::new();
    let client = GeminiClient::with_credentials(credentials.clone())
        .unwrap()
        .with_endpoint(server.uri())
        .with_video_model("test-video".to_string());

    let err = client.generate_video("a prompt").await.unwrap_err();
    assert!(matches!(err, GeminiError::ApiError { status: 400, .. }));
    assert_eq!(credentials.calls(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_poll_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": OPERATION_NAME
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OPERATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": OPERATION_NAME,
            "done": false
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_video("a prompt")
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::PollTimeout { attempts: 3 }));
}

#[tokio::test]
async fn test_finished_operation_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": OPERATION_NAME,
            "done": true,
            "error": { "code": 3, "message": "Prompt rejected by safety filter" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_video("a prompt")
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::VideoFailed(ref m) if m.contains("safety")));
}

#[tokio::test]
async fn test_empty_video_prompt_is_rejected_without_request() {
    let server = MockServer::start().await;
    let err = client_for(&server).generate_video("   ").await.unwrap_err();
    assert!(matches!(err, GeminiError::VideoFailed(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_video_streams_to_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/video.mp4"))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"fake-video-bytes".to_vec())
                .insert_header("content-type", "video/mp4"),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("nested").join("preview.mp4");
    let url = format!("{}/files/video.mp4", server.uri());

    let saved = client_for(&server).download_video(&url, &dest).await.unwrap();
    assert_eq!(saved, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), b"fake-video-bytes");
}
