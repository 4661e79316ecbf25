//! Session persistence between CLI invocations.
//!
//! The last generated bundle, the edited copy, the video URL and the
//! selected tab are stored as JSON so `show`, `edit` and `video` can run
//! as separate commands.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::content::{GeneratedContent, Platform, Tone};
use crate::store::ContentStore;
use crate::view::ViewState;

#[derive(Debug)]
pub enum SessionError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "Session file error: {}", e),
            SessionError::Parse(e) => write!(f, "Session file is corrupt: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Parse(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub generated: GeneratedContent,
    pub working: GeneratedContent,
    /// Bare media URI; the key is appended only when printing or downloading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub tone: Tone,
}

impl Session {
    /// Default: ~/.local/share/viral-engine/session.json
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("viral-engine")
            .join("session.json")
    }

    /// Snapshot the store. `None` when nothing has been generated.
    pub fn capture(store: &ContentStore, view: &ViewState) -> Option<Self> {
        let generated = store.generated()?.clone();
        let working = store.working().cloned().unwrap_or_else(|| generated.clone());
        Some(Self {
            generated,
            working,
            video_url: store.video_url().map(str::to_string),
            platform: view.platform,
            tone: view.tone,
        })
    }

    /// Rebuild the store and view selection.
    pub fn into_parts(self) -> (ContentStore, ViewState) {
        let view = ViewState::new(self.platform, self.tone);
        let store = ContentStore::restore(self.generated, Some(self.working), self.video_url);
        (store, view)
    }

    /// Load a session. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write the session through a temporary file and rename it into place.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        log::debug!("Session saved to {}", path.display());
        Ok(())
    }
}
