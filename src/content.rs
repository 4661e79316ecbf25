//! Content model shared by the request client, the store and the views.
//!
//! Field names on the wire follow the response schema pinned in
//! [`crate::gemini::generated_content_schema`], so every struct here renames to camelCase.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Text used when the user submits an image without describing it.
pub const DEFAULT_IMAGE_TEXT: &str =
    "Describe this image in detail and create viral content from it.";

/// Minimum number of characters the long article is asked to exceed.
pub const ARTICLE_MIN_CHARS: usize = 6000;

/// Inclusive range of tweets the thread is asked to contain.
pub const THREAD_LEN_RANGE: std::ops::RangeInclusive<usize> = 5..=10;

/// Errors raised while assembling or validating content.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Nothing to generate from: provide text or an image")]
    Empty,

    #[error("Image supplied without a MIME type")]
    MissingMimeType,

    #[error("Unsupported image type '{0}' (expected png, jpg, jpeg, webp, gif, heic or heif)")]
    UnsupportedImage(String),

    #[error("Failed to read image '{path}': {source}")]
    ReadImage {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid content: {0}")]
    Invalid(String),
}

/// Stylistic variant applied uniformly across all platform content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    Casual,
    Wise,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Formal, Tone::Casual, Tone::Wise];

    /// Name used by the model schema and in headings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
            Tone::Wise => "Wise",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            "wise" => Ok(Tone::Wise),
            other => Err(format!(
                "Unknown tone '{}'. Available tones: formal, casual, wise",
                other
            )),
        }
    }
}

/// Target content surface with its own rendering and editing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Twitter,
    #[serde(rename = "linkedin")]
    LinkedIn,
    Facebook,
    Video,
    Article,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::LinkedIn,
        Platform::Facebook,
        Platform::Video,
        Platform::Article,
    ];

    /// Tab label shown in the platform bar.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter Thread",
            Platform::LinkedIn => "LinkedIn",
            Platform::Facebook => "Facebook",
            Platform::Video => "TikTok / Reels",
            Platform::Article => "Long Article",
        }
    }

    /// The article is generated once, without tone variants.
    pub fn has_tones(&self) -> bool {
        !matches!(self, Platform::Article)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" | "x" | "thread" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::LinkedIn),
            "facebook" => Ok(Platform::Facebook),
            "video" | "tiktok" | "reels" => Ok(Platform::Video),
            "article" => Ok(Platform::Article),
            other => Err(format!(
                "Unknown platform '{}'. Available platforms: twitter, linkedin, facebook, video, article",
                other
            )),
        }
    }
}

/// User input for one generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputData {
    pub text: String,
    /// Base64-encoded image bytes.
    pub image: Option<String>,
    pub mime_type: Option<String>,
}

impl InputData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            mime_type: None,
        }
    }

    /// Input carrying an already-encoded image.
    ///
    /// Blank text is replaced with [`DEFAULT_IMAGE_TEXT`].
    pub fn with_image(
        text: impl Into<String>,
        image_base64: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let text = if text.trim().is_empty() {
            DEFAULT_IMAGE_TEXT.to_string()
        } else {
            text
        };
        Self {
            text,
            image: Some(image_base64.into()),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Read and base64-encode an image file, inferring its MIME type from the extension.
    pub fn from_image_file(path: &Path, text: Option<&str>) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let mime_type = mime_type_for_extension(&ext)
            .ok_or_else(|| InputError::UnsupportedImage(ext.clone()))?;

        let bytes = std::fs::read(path).map_err(|e| InputError::ReadImage {
            path: path.display().to_string(),
            source: e,
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        Ok(Self::with_image(text.unwrap_or(""), encoded, mime_type))
    }

    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Whether the submit control should be enabled for this input.
    pub fn is_submittable(&self) -> bool {
        !self.text.trim().is_empty() || self.has_image()
    }

    /// Check the invariants the prompt builder relies on.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.is_submittable() {
            return Err(InputError::Empty);
        }
        if self.has_image() && self.mime_type.as_deref().map_or(true, |m| m.trim().is_empty()) {
            return Err(InputError::MissingMimeType);
        }
        Ok(())
    }
}

fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScript {
    pub hook: String,
    pub body: String,
    pub call_to_action: String,
    pub visual_cues: String,
}

/// Platform content for a single tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialContent {
    pub twitter_thread: Vec<String>,
    pub linked_in_post: String,
    pub facebook_post: String,
    pub video_script: VideoScript,
}

/// One [`SocialContent`] per tone. Every tone is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variations {
    #[serde(rename = "Formal")]
    pub formal: SocialContent,
    #[serde(rename = "Casual")]
    pub casual: SocialContent,
    #[serde(rename = "Wise")]
    pub wise: SocialContent,
}

impl Variations {
    pub fn get(&self, tone: Tone) -> &SocialContent {
        match tone {
            Tone::Formal => &self.formal,
            Tone::Casual => &self.casual,
            Tone::Wise => &self.wise,
        }
    }

    pub fn get_mut(&mut self, tone: Tone) -> &mut SocialContent {
        match tone {
            Tone::Formal => &mut self.formal,
            Tone::Casual => &mut self.casual,
            Tone::Wise => &mut self.wise,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tone, &SocialContent)> {
        Tone::ALL.into_iter().map(move |tone| (tone, self.get(tone)))
    }
}

/// Predicted engagement, each dimension scored 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViralityScore {
    pub emotion: f64,
    pub logic: f64,
    pub trendiness: f64,
    pub clarity: f64,
    pub controversy: f64,
}

impl ViralityScore {
    /// Labelled sub-scores in radar order.
    pub fn dimensions(&self) -> [(&'static str, f64); 5] {
        [
            ("Emotion", self.emotion),
            ("Logic", self.logic),
            ("Trend", self.trendiness),
            ("Clarity", self.clarity),
            ("Controversy", self.controversy),
        ]
    }
}

/// The full bundle produced by one model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub variations: Variations,
    pub long_article: String,
    pub suggested_hashtags: Vec<String>,
    pub suggested_keywords: Vec<String>,
    pub virality_score: ViralityScore,
}

impl GeneratedContent {
    /// Reject responses that parse but break the content contract.
    ///
    /// Hard failures: out-of-range scores, empty threads, empty article.
    /// Thread length and article length only produce warnings.
    pub fn validate(&self) -> Result<(), InputError> {
        for (name, value) in self.virality_score.dimensions() {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(InputError::Invalid(format!(
                    "virality score '{}' out of range: {}",
                    name, value
                )));
            }
        }

        for (tone, social) in self.variations.iter() {
            if social.twitter_thread.is_empty() {
                return Err(InputError::Invalid(format!(
                    "{} variation has an empty twitter thread",
                    tone
                )));
            }
            if !THREAD_LEN_RANGE.contains(&social.twitter_thread.len()) {
                log::warn!(
                    "{} thread has {} tweets, expected {}-{}",
                    tone,
                    social.twitter_thread.len(),
                    THREAD_LEN_RANGE.start(),
                    THREAD_LEN_RANGE.end()
                );
            }
        }

        if self.long_article.trim().is_empty() {
            return Err(InputError::Invalid("long article is empty".to_string()));
        }
        let article_chars = self.long_article.chars().count();
        if article_chars <= ARTICLE_MIN_CHARS {
            log::warn!(
                "Article has {} characters, expected more than {}",
                article_chars,
                ARTICLE_MIN_CHARS
            );
        }

        Ok(())
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::generated;
    use super::*;

    #[test]
    fn test_tone_from_str_is_case_insensitive() {
        assert_eq!("Formal".parse::<Tone>().unwrap(), Tone::Formal);
        assert_eq!("CASUAL".parse::<Tone>().unwrap(), Tone::Casual);
        assert_eq!(" wise ".parse::<Tone>().unwrap(), Tone::Wise);
        assert!("angry".parse::<Tone>().is_err());
    }

    #[test]
    fn test_platform_from_str_aliases() {
        assert_eq!("x".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!("LinkedIn".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert_eq!("reels".parse::<Platform>().unwrap(), Platform::Video);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_article_has_no_tones() {
        for platform in Platform::ALL {
            assert_eq!(platform.has_tones(), platform != Platform::Article);
        }
    }

    #[test]
    fn test_defaults_are_twitter_and_formal() {
        assert_eq!(Platform::default(), Platform::Twitter);
        assert_eq!(Tone::default(), Tone::Formal);
    }

    #[test]
    fn test_image_without_text_uses_default_text() {
        let input = InputData::with_image("   ", "aGVsbG8=", "image/png");
        assert_eq!(input.text, DEFAULT_IMAGE_TEXT);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        let input = InputData::text("  \n ");
        assert!(!input.is_submittable());
        assert!(matches!(input.validate(), Err(InputError::Empty)));
    }

    #[test]
    fn test_validate_rejects_image_without_mime_type() {
        let input = InputData {
            text: "chart".to_string(),
            image: Some("aGVsbG8=".to_string()),
            mime_type: Some(" ".to_string()),
        };
        assert!(matches!(input.validate(), Err(InputError::MissingMimeType)));
    }

    #[test]
    fn test_from_image_file_encodes_and_detects_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.JPG");
        std::fs::write(&path, b"hello").unwrap();

        let input = InputData::from_image_file(&path, Some("Q3 revenue")).unwrap();
        assert_eq!(input.text, "Q3 revenue");
        assert_eq!(input.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(input.mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_from_image_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let result = InputData::from_image_file(&path, None);
        assert!(matches!(result, Err(InputError::UnsupportedImage(ext)) if ext == "txt"));
    }

    #[test]
    fn test_generated_content_json_uses_schema_names() {
        let json = serde_json::to_value(generated()).unwrap();
        assert!(json["variations"]["Formal"]["twitterThread"].is_array());
        assert!(json["variations"]["Wise"]["videoScript"]["callToAction"].is_string());
        assert!(json["longArticle"].is_string());
        assert!(json["viralityScore"]["trendiness"].is_number());
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let mut content = generated();
        content.virality_score.controversy = 140.0;
        assert!(matches!(content.validate(), Err(InputError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_thread() {
        let mut content = generated();
        content.variations.casual.twitter_thread.clear();
        assert!(content.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_short_article_with_warning() {
        let mut content = generated();
        content.long_article = "short".to_string();
        assert!(content.validate().is_ok());
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
