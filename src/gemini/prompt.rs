//! Prompt builder: turns [`InputData`] into a `generateContent` request body.
//!
//! Pure functions only; nothing here touches the network.

use serde::Serialize;

use super::error::GeminiError;
use super::schema::generated_content_schema;
use crate::content::{truncate_chars, InputData, VideoScript, ARTICLE_MIN_CHARS, THREAD_LEN_RANGE};

/// Preface added after an inline image part.
pub const IMAGE_PREFACE: &str = "Analyze this image and the input text to create viral content.";

/// Default maximum number of characters sent as a video prompt.
pub const DEFAULT_VIDEO_PROMPT_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestContent {
    pub role: String,
    pub parts: Vec<Part>,
}

/// A single request part: inline binary data or text.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

impl Part {
    pub fn is_inline_data(&self) -> bool {
        matches!(self, Part::InlineData { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

impl GenerateContentRequest {
    /// All parts of the single user turn.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.contents.iter().flat_map(|c| c.parts.iter())
    }
}

/// Instruction text sent with every generation.
pub fn instructions(source: &str) -> String {
    format!(
        "Act as a world-class viral content strategist.\n\
         SOURCE: \"{source}\"\n\
         \n\
         TASK:\n\
         Generate content in Formal, Casual, and Wise tones.\n\
         For each tone write a Twitter thread of {min}-{max} tweets, a LinkedIn post, a Facebook post, \
         and a high-impact video script with a hook, body, call to action and visual cues.\n\
         Write one 'Long Article' that is exhaustive, SEO-ready, and over {article} characters.\n\
         Suggest hashtags and keywords.\n\
         Score virality from 0 to 100 on emotion, logic, trendiness, clarity and controversy.\n",
        source = source,
        min = THREAD_LEN_RANGE.start(),
        max = THREAD_LEN_RANGE.end(),
        article = ARTICLE_MIN_CHARS,
    )
}

/// Build the content request for the given input.
///
/// # Errors
///
/// Returns `GeminiError::InvalidInput` if the input has neither text nor an
/// image, or carries an image without a MIME type.
pub fn build_request(input: &InputData) -> Result<GenerateContentRequest, GeminiError> {
    input.validate()?;

    let mut parts = Vec::with_capacity(3);

    if let (Some(image), Some(mime_type)) = (input.image.as_deref(), input.mime_type.as_deref()) {
        if !image.is_empty() {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: image.to_string(),
                },
            });
            parts.push(Part::Text {
                text: IMAGE_PREFACE.to_string(),
            });
        }
    }

    parts.push(Part::Text {
        text: instructions(&input.text),
    });

    Ok(GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user".to_string(),
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: generated_content_schema(),
        },
    })
}

/// Natural-language prompt for the preview video of a script.
pub fn video_prompt(script: &VideoScript) -> String {
    format!("Vertical video. {}. {}", script.visual_cues, script.hook)
}

/// Clip a video prompt to the provider's prompt budget.
pub fn truncate_video_prompt(prompt: &str, max_chars: usize) -> String {
    truncate_chars(prompt, max_chars).to_string()
}
