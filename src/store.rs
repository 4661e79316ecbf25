//! Content store: the latest generated bundle, its editable working copy,
//! and the in-flight flags for generation and video jobs.
//!
//! Every generation is tagged with a [`GenerationTicket`]. Results carrying
//! an outdated ticket are dropped, so a slow response can never overwrite
//! content produced by a newer request.

use crate::content::{GeneratedContent, Platform, Tone};
use crate::gemini::{GeminiError, VIDEO_FAILED_MESSAGE};

/// Identifies one content generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenerationTicket(u64);

/// Identifies one video job and the content generation it was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTicket {
    generation: u64,
    id: u64,
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result replaced the store's state.
    Updated,
    /// The request failed; prior content is kept and an error is recorded.
    Failed,
    /// A newer request superseded this one; the result was discarded.
    Stale,
}

/// A single leaf of the working copy to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Article(String),
    /// Zero-based tweet index within the thread.
    Tweet { index: usize, text: String },
    LinkedIn(String),
    Facebook(String),
    VideoHook(String),
    VideoBody(String),
    VideoCallToAction(String),
    VideoVisualCues(String),
}

impl Edit {
    /// Platform tab the edited field belongs to.
    pub fn platform(&self) -> Platform {
        match self {
            Edit::Article(_) => Platform::Article,
            Edit::Tweet { .. } => Platform::Twitter,
            Edit::LinkedIn(_) => Platform::LinkedIn,
            Edit::Facebook(_) => Platform::Facebook,
            Edit::VideoHook(_)
            | Edit::VideoBody(_)
            | Edit::VideoCallToAction(_)
            | Edit::VideoVisualCues(_) => Platform::Video,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No content to edit yet. Generate something first.")]
    NoContent,

    #[error("Tweet {number} does not exist (thread has {len} tweets)")]
    TweetOutOfRange {
        /// One-based tweet number as shown to the user
        number: usize,
        len: usize,
    },

    #[error("A generation is already in progress")]
    AlreadyGenerating,

    #[error("A video is already being generated")]
    AlreadyGeneratingVideo,
}

#[derive(Debug, Default, Clone)]
pub struct ContentStore {
    generated: Option<GeneratedContent>,
    working: Option<GeneratedContent>,
    generating: bool,
    error: Option<String>,
    video_url: Option<String>,
    video_generating: bool,
    video_error: Option<String>,
    latest_generation: u64,
    latest_video: u64,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with previously generated content and its edited copy.
    pub fn restore(
        generated: GeneratedContent,
        working: Option<GeneratedContent>,
        video_url: Option<String>,
    ) -> Self {
        let working = working.unwrap_or_else(|| generated.clone());
        Self {
            generated: Some(generated),
            working: Some(working),
            video_url,
            ..Self::default()
        }
    }

    pub fn generated(&self) -> Option<&GeneratedContent> {
        self.generated.as_ref()
    }

    /// The edited copy shown to the user.
    pub fn working(&self) -> Option<&GeneratedContent> {
        self.working.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Media URI of the preview video. Never carries the access key.
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn is_video_generating(&self) -> bool {
        self.video_generating
    }

    pub fn video_error(&self) -> Option<&str> {
        self.video_error.as_deref()
    }

    /// Start a generation. Any earlier in-flight generation becomes stale.
    pub fn begin_generation(&mut self) -> GenerationTicket {
        self.latest_generation += 1;
        self.generating = true;
        self.error = None;
        GenerationTicket(self.latest_generation)
    }

    /// Start a generation unless one is already running.
    pub fn try_begin_generation(&mut self) -> Result<GenerationTicket, StoreError> {
        if self.generating {
            return Err(StoreError::AlreadyGenerating);
        }
        Ok(self.begin_generation())
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        ticket.0 == self.latest_generation
    }

    /// Apply the outcome of a generation request.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GeneratedContent, GeminiError>,
    ) -> Applied {
        if !self.is_current(ticket) {
            log::warn!(
                "Discarding result of generation {} (latest is {})",
                ticket.0,
                self.latest_generation
            );
            return Applied::Stale;
        }

        self.generating = false;
        match result {
            Ok(content) => {
                self.working = Some(content.clone());
                self.generated = Some(content);
                self.video_url = None;
                self.video_error = None;
                self.error = None;
                Applied::Updated
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                self.error = Some(e.user_message());
                Applied::Failed
            }
        }
    }

    /// Overwrite one leaf of the working copy for `tone`.
    ///
    /// The tone is ignored for article edits.
    pub fn apply_edit(&mut self, tone: Tone, edit: Edit) -> Result<(), StoreError> {
        let working = self.working.as_mut().ok_or(StoreError::NoContent)?;

        match edit {
            Edit::Article(text) => working.long_article = text,
            Edit::Tweet { index, text } => {
                let thread = &mut working.variations.get_mut(tone).twitter_thread;
                let len = thread.len();
                let tweet = thread.get_mut(index).ok_or(StoreError::TweetOutOfRange {
                    number: index + 1,
                    len,
                })?;
                *tweet = text;
            }
            Edit::LinkedIn(text) => working.variations.get_mut(tone).linked_in_post = text,
            Edit::Facebook(text) => working.variations.get_mut(tone).facebook_post = text,
            Edit::VideoHook(text) => working.variations.get_mut(tone).video_script.hook = text,
            Edit::VideoBody(text) => working.variations.get_mut(tone).video_script.body = text,
            Edit::VideoCallToAction(text) => {
                working.variations.get_mut(tone).video_script.call_to_action = text
            }
            Edit::VideoVisualCues(text) => {
                working.variations.get_mut(tone).video_script.visual_cues = text
            }
        }
        Ok(())
    }

    /// Throw away all edits and start again from the generated content.
    pub fn reset_edits(&mut self) -> Result<(), StoreError> {
        let generated = self.generated.as_ref().ok_or(StoreError::NoContent)?;
        self.working = Some(generated.clone());
        Ok(())
    }

    /// Start a video job for the current content.
    pub fn begin_video(&mut self) -> Result<VideoTicket, StoreError> {
        if self.working.is_none() {
            return Err(StoreError::NoContent);
        }
        if self.video_generating {
            return Err(StoreError::AlreadyGeneratingVideo);
        }
        self.latest_video += 1;
        self.video_generating = true;
        self.video_error = None;
        Ok(VideoTicket {
            generation: self.latest_generation,
            id: self.latest_video,
        })
    }

    /// Apply the outcome of a video job.
    ///
    /// Results for content that has since been regenerated are discarded.
    pub fn complete_video(
        &mut self,
        ticket: VideoTicket,
        result: Result<String, GeminiError>,
    ) -> Applied {
        if ticket.id != self.latest_video {
            return Applied::Stale;
        }
        self.video_generating = false;

        if ticket.generation != self.latest_generation {
            log::warn!("Discarding video generated for replaced content");
            return Applied::Stale;
        }

        match result {
            Ok(url) => {
                self.video_url = Some(url);
                Applied::Updated
            }
            Err(e) => {
                log::error!("Video generation failed: {}", e);
                self.video_error = Some(VIDEO_FAILED_MESSAGE.to_string());
                Applied::Failed
            }
        }
    }
}
