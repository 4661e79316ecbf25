//! ContentCache - persistent disk cache for generated content bundles.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::content::{GeneratedContent, InputData};

/// Separator between hashed key fields so ("ab", "c") and ("a", "bc") differ.
const KEY_SEPARATOR: u8 = 0x1f;

/// Hex length of an entry key (16 bytes).
const HASH_LEN: usize = 32;

/// Persistent disk cache for generated content, keyed by model and input.
pub struct ContentCache {
    cache_dir: PathBuf,
}

impl ContentCache {
    /// Create a new ContentCache with the given cache directory.
    /// Does not create the directory - call `ensure_dir_exists()` to create it.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Default: ~/.cache/viral-engine/content/
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("viral-engine")
            .join("content")
    }

    pub fn ensure_dir_exists(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.cache_dir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Deterministic key for a model and input.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    pub fn hash_input(model: &str, input: &InputData) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([KEY_SEPARATOR]);
        hasher.update(input.text.as_bytes());
        hasher.update([KEY_SEPARATOR]);
        hasher.update(input.mime_type.as_deref().unwrap_or("").as_bytes());
        hasher.update([KEY_SEPARATOR]);
        hasher.update(input.image.as_deref().unwrap_or("").as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    fn content_path(&self, hash: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hash))
    }

    fn input_path(&self, hash: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.input", hash))
    }

    /// Get cached content for this model and input, if present and readable.
    ///
    /// An unreadable entry is treated as a miss.
    pub fn get(&self, model: &str, input: &InputData) -> Option<GeneratedContent> {
        let hash = Self::hash_input(model, input);
        let raw = std::fs::read_to_string(self.content_path(&hash)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(content) => {
                log::debug!("Content cache hit: {}", hash);
                Some(content)
            }
            Err(e) => {
                log::warn!("Ignoring corrupt cache entry {}: {}", hash, e);
                None
            }
        }
    }

    /// Store content for this model and input, along with the input text.
    pub fn store(
        &self,
        model: &str,
        input: &InputData,
        content: &GeneratedContent,
    ) -> Result<PathBuf, std::io::Error> {
        self.ensure_dir_exists()?;
        let hash = Self::hash_input(model, input);
        let path = self.content_path(&hash);
        let json = serde_json::to_string_pretty(content)?;
        std::fs::write(&path, json)?;
        std::fs::write(self.input_path(&hash), &input.text)?;
        Ok(path)
    }

    /// Whether `hash` looks like a key produced by [`ContentCache::hash_input`].
    pub fn is_valid_hash(hash: &str) -> bool {
        hash.len() == HASH_LEN && hash.chars().all(|c| c.is_ascii_hexdigit())
    }

    fn get_input_text(&self, hash: &str) -> Option<String> {
        std::fs::read_to_string(self.input_path(hash)).ok()
    }

    fn is_content_file(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("json")
    }

    /// List all cached entries sorted by hash.
    pub fn list_entries(&self) -> Result<Vec<CacheEntry>, std::io::Error> {
        let mut entries = Vec::new();

        if !self.cache_dir.exists() {
            return Ok(entries);
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !Self::is_content_file(&path) {
                continue;
            }

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let hash = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();
            let input_text = self.get_input_text(&hash);

            entries.push(CacheEntry {
                hash,
                input_text,
                size_bytes: metadata.len(),
                path,
            });
        }

        entries.sort_by(|a, b| a.hash.cmp(&b.hash));
        Ok(entries)
    }

    /// Remove a cached entry by its hash.
    /// Returns true if an entry was removed, false if it didn't exist.
    /// Anything other than a 32-character hex key is rejected, so a hash can
    /// never name a file outside the cache directory.
    pub fn remove(&self, hash: &str) -> Result<bool, std::io::Error> {
        if !Self::is_valid_hash(hash) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a cache hash (expected {} hex characters)", hash, HASH_LEN),
            ));
        }
        let content_path = self.content_path(hash);
        let mut removed = false;

        if content_path.exists() {
            std::fs::remove_file(&content_path)?;
            removed = true;
        }
        let _ = std::fs::remove_file(self.input_path(hash));

        Ok(removed)
    }

    /// Remove all cached entries. Returns the number of entries removed.
    pub fn clear_all(&self) -> Result<usize, std::io::Error> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if Self::is_content_file(&path) {
                if std::fs::remove_file(&path).is_ok() {
                    count += 1;
                }
            } else if path.extension().and_then(|e| e.to_str()) == Some("input") {
                let _ = std::fs::remove_file(&path);
            }
        }

        Ok(count)
    }

    /// Total size of all cached content files in bytes.
    pub fn total_size_bytes(&self) -> Result<u64, std::io::Error> {
        Ok(self.list_entries()?.iter().map(|e| e.size_bytes).sum())
    }
}

/// Information about a cached content entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// First 32 hex chars of the SHA256 of model and input
    pub hash: String,
    /// Input text, if metadata was stored
    pub input_text: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}
