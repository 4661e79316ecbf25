//! Presentation of the content store as a tabbed text view.
//!
//! Rendering is a pure function of the store and an explicit [`ViewState`].

use std::fmt;

use crate::content::{GeneratedContent, Platform, SocialContent, Tone, ViralityScore};
use crate::store::ContentStore;

/// Width of the score bars in the score panel.
const SCORE_BAR_WIDTH: usize = 20;

/// Number of keywords shown above the editor.
const KEYWORDS_SHOWN: usize = 3;

/// Selected platform tab and tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub platform: Platform,
    pub tone: Tone,
}

impl ViewState {
    pub fn new(platform: Platform, tone: Tone) -> Self {
        Self { platform, tone }
    }

    pub fn select_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    pub fn select_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    /// The tone in effect, or `None` on the article tab.
    pub fn effective_tone(&self) -> Option<Tone> {
        self.platform.has_tones().then_some(self.tone)
    }
}

/// Headline virality score: mean of emotion, trendiness and logic.
pub fn aggregate_score(score: &ViralityScore) -> u32 {
    ((score.emotion + score.trendiness + score.logic) / 3.0).round() as u32
}

/// Mean of emotion and trendiness.
pub fn impact_score(score: &ViralityScore) -> u32 {
    ((score.emotion + score.trendiness) / 2.0).round() as u32
}

/// Mean of logic and clarity.
pub fn quality_score(score: &ViralityScore) -> u32 {
    ((score.logic + score.clarity) / 2.0).round() as u32
}

/// Plain text of the visible tab, ready for the clipboard.
pub fn copy_text(content: &GeneratedContent, state: &ViewState) -> String {
    let social = content.variations.get(state.tone);
    match state.platform {
        Platform::Article => content.long_article.clone(),
        Platform::Twitter => social.twitter_thread.join("\n\n"),
        Platform::LinkedIn => social.linked_in_post.clone(),
        Platform::Facebook => social.facebook_post.clone(),
        Platform::Video => format!(
            "{}\n{}\n{}",
            social.video_script.hook, social.video_script.body, social.video_script.call_to_action
        ),
    }
}

/// What the output panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    /// Nothing generated yet.
    Empty { error: Option<&'a str> },
    Generating,
    Ready(ReadyView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyView<'a> {
    pub state: ViewState,
    pub content: &'a GeneratedContent,
    pub aggregate: u32,
    pub video_url: Option<&'a str>,
    pub video_generating: bool,
    pub error: Option<&'a str>,
    pub video_error: Option<&'a str>,
}

/// Compute the view for the current store and selection.
pub fn render<'a>(store: &'a ContentStore, state: &ViewState) -> View<'a> {
    if store.is_generating() {
        return View::Generating;
    }
    match store.working() {
        None => View::Empty {
            error: store.error(),
        },
        Some(content) => View::Ready(ReadyView {
            state: *state,
            content,
            aggregate: aggregate_score(&content.virality_score),
            video_url: store.video_url(),
            video_generating: store.is_video_generating(),
            error: store.error(),
            video_error: store.video_error(),
        }),
    }
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty { error } => {
                if let Some(error) = error {
                    writeln!(f, "Error: {}", error)?;
                    writeln!(f)?;
                }
                writeln!(f, "Ready for impact?")?;
                writeln!(
                    f,
                    "Enter a topic, a link, or an image. Content is generated for Twitter, \
                     LinkedIn, Facebook, a video script and a long article."
                )
            }
            View::Generating => {
                writeln!(f, "Crafting viral content...")?;
                writeln!(
                    f,
                    "Analyzing patterns and generating multi-tone variations."
                )
            }
            View::Ready(ready) => fmt::Display::fmt(ready, f),
        }
    }
}

fn score_bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * SCORE_BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(SCORE_BAR_WIDTH - filled))
}

impl ReadyView<'_> {
    fn write_tabs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tabs: Vec<String> = Platform::ALL
            .iter()
            .map(|p| {
                if *p == self.state.platform {
                    format!("[{}]", p.label())
                } else {
                    format!(" {} ", p.label())
                }
            })
            .collect();
        writeln!(f, "{}", tabs.join(" "))
    }

    fn write_tones(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tones: Vec<String> = Tone::ALL
            .iter()
            .map(|t| {
                if *t == self.state.tone {
                    format!("[{}]", t.as_str().to_uppercase())
                } else {
                    format!(" {} ", t.as_str().to_uppercase())
                }
            })
            .collect();
        writeln!(f, "{}    Viral Score: {}/100", tones.join(" "), self.aggregate)
    }

    fn write_keywords(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords: Vec<&str> = self
            .content
            .suggested_keywords
            .iter()
            .take(KEYWORDS_SHOWN)
            .map(String::as_str)
            .collect();
        if !keywords.is_empty() {
            writeln!(f, "Keywords: {}", keywords.join(", "))?;
        }
        Ok(())
    }

    fn write_social(&self, f: &mut fmt::Formatter<'_>, social: &SocialContent) -> fmt::Result {
        match self.state.platform {
            Platform::Twitter => {
                for (i, tweet) in social.twitter_thread.iter().enumerate() {
                    writeln!(f, "{:>2}. {}", i + 1, tweet)?;
                    writeln!(f)?;
                }
            }
            Platform::LinkedIn => writeln!(f, "{}", social.linked_in_post)?,
            Platform::Facebook => writeln!(f, "{}", social.facebook_post)?,
            Platform::Video => {
                let script = &social.video_script;
                writeln!(f, "HOOK (0-3s)")?;
                writeln!(f, "{}", script.hook)?;
                writeln!(f)?;
                writeln!(f, "SCRIPT BODY")?;
                writeln!(f, "{}", script.body)?;
                writeln!(f)?;
                writeln!(f, "CALL TO ACTION")?;
                writeln!(f, "{}", script.call_to_action)?;
                writeln!(f)?;
                writeln!(f, "VISUAL DIRECTION")?;
                writeln!(f, "{}", script.visual_cues)?;
                writeln!(f)?;
                if let Some(url) = self.video_url {
                    writeln!(f, "Preview video (720p, 9:16): {}", url)?;
                } else if self.video_generating {
                    writeln!(f, "Preview video: generating...")?;
                } else if let Some(error) = self.video_error {
                    writeln!(f, "Preview video: {}", error)?;
                } else {
                    writeln!(f, "Preview video: not generated (use the video command)")?;
                }
            }
            Platform::Article => {}
        }
        Ok(())
    }

    fn write_scores(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = &self.content.virality_score;
        writeln!(f, "VIRALITY DNA")?;
        for (label, value) in score.dimensions() {
            writeln!(f, "  {:<12} {} {:>3}", label, score_bar(value), value.round() as i64)?;
        }
        writeln!(
            f,
            "  Impact Score: {}   Quality Score: {}",
            impact_score(score),
            quality_score(score)
        )?;
        if !self.content.suggested_hashtags.is_empty() {
            writeln!(f, "HASHTAGS")?;
            writeln!(f, "  {}", self.content.suggested_hashtags.join(" "))?;
        }
        Ok(())
    }
}

impl fmt::Display for ReadyView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = self.error {
            writeln!(f, "Error: {}", error)?;
            writeln!(f)?;
        }

        self.write_tabs(f)?;
        if self.state.platform.has_tones() {
            self.write_tones(f)?;
        }
        writeln!(f)?;

        match self.state.effective_tone() {
            None => writeln!(f, "== Long-Form Article ==")?,
            Some(tone) => writeln!(f, "== {} Variation ==", tone)?,
        }
        self.write_keywords(f)?;
        writeln!(f)?;

        match self.state.effective_tone() {
            None => {
                writeln!(f, "{}", self.content.long_article)?;
                writeln!(f)?;
                writeln!(
                    f,
                    "({} characters)",
                    self.content.long_article.chars().count()
                )?;
            }
            Some(tone) => self.write_social(f, self.content.variations.get(tone))?,
        }

        writeln!(f)?;
        self.write_scores(f)
    }
}
