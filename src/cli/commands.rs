//! Subcommand handlers.
//!
//! Each handler returns `Err` with a human-readable message; `main` prints
//! it and exits with status 1.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::args::{CacheAction, Command, ConfigAction, EditField};
use super::enums::{PlatformArg, ToneArg};
use crate::cache::ContentCache;
use crate::config::{self, Config};
use crate::content::{truncate_chars, InputData, Platform};
use crate::event_loop::{self, Engine};
use crate::gemini::{
    CredentialSource, EnvCredentials, GeminiClient, GeminiError, GENERATION_FAILED_MESSAGE,
    VIDEO_FAILED_MESSAGE,
};
use crate::session::Session;
use crate::store::{Applied, ContentStore};
use crate::view::{self, ViewState};

/// Everything a handler needs besides its arguments.
pub struct Context {
    pub config: Config,
    /// Explicit `--config` path, if any
    pub config_path: Option<PathBuf>,
    pub session_path: PathBuf,
    pub credentials: Arc<dyn CredentialSource>,
}

impl Context {
    /// Load configuration and use the environment for credentials.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, String> {
        let config = Config::load(config_path.as_deref()).map_err(|e| e.to_string())?;
        Ok(Self {
            config,
            config_path,
            session_path: Session::default_path(),
            credentials: Arc::new(EnvCredentials),
        })
    }

    /// Build a client from the configured endpoint, models and polling policy.
    pub fn client(&self) -> Result<GeminiClient, String> {
        let api = &self.config.api;
        let client = GeminiClient::with_credentials(Arc::clone(&self.credentials))
            .map_err(missing_key_help)?
            .with_endpoint(api.base_url.clone())
            .with_content_model(api.content_model.clone())
            .with_video_model(api.video_model.clone())
            .with_poll_policy(self.config.video.poll_policy())
            .with_video_prompt_max_chars(self.config.video.prompt_max_chars)
            .with_timeout(self.config.timeout())
            .map_err(|e| format!("Failed to create Gemini client: {}", e))?;
        Ok(client)
    }

    pub fn engine(&self) -> Result<Engine, String> {
        let cache = if self.config.cache.enabled {
            Some(ContentCache::new(self.config.cache.dir()))
        } else {
            None
        };
        Ok(Engine::new(self.client()?, cache))
    }

    fn load_session(&self) -> Result<Session, String> {
        Session::load(&self.session_path)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "No content yet. Run `viral generate` first.".to_string())
    }

    fn save(&self, store: &ContentStore, view: &ViewState) -> Result<(), String> {
        match Session::capture(store, view) {
            Some(session) => session
                .save(&self.session_path)
                .map_err(|e| format!("Failed to save session: {}", e)),
            None => Ok(()),
        }
    }

    /// View selection: flags first, then the given fallback.
    fn view_state(
        fallback: ViewState,
        platform: Option<PlatformArg>,
        tone: Option<ToneArg>,
    ) -> ViewState {
        ViewState::new(
            platform.map(Into::into).unwrap_or(fallback.platform),
            tone.map(Into::into).unwrap_or(fallback.tone),
        )
    }
}

fn missing_key_help(e: GeminiError) -> String {
    match e {
        GeminiError::MissingApiKey => "GEMINI_API_KEY environment variable is not set.\n\n\
            Add your API key to a .env file:\n    \
            echo 'GEMINI_API_KEY=your-api-key-here' >> .env\n\n\
            Or set it as an environment variable:\n    \
            export GEMINI_API_KEY=\"your-api-key-here\"\n\n\
            Get your API key at: https://aistudio.google.com/apikey"
            .to_string(),
        other => format!("Failed to create Gemini client: {}", other),
    }
}

/// Run one parsed command on a fresh runtime.
pub fn run(command: Command, config_path: Option<PathBuf>) -> Result<(), String> {
    let ctx = Context::load(config_path)?;
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;
    rt.block_on(execute(&ctx, command))
}

pub async fn execute(ctx: &Context, command: Command) -> Result<(), String> {
    match command {
        Command::Generate {
            text,
            image,
            platform,
            tone,
            no_cache,
            json,
        } => {
            let options = GenerateOptions {
                platform,
                tone,
                no_cache,
                json,
            };
            run_generate(ctx, text, image.as_deref(), options).await
        }
        Command::Show { platform, tone } => run_show(ctx, platform, tone),
        Command::Copy { platform, tone } => run_copy(ctx, platform, tone),
        Command::Edit { field, tone } => run_edit(ctx, field, tone),
        Command::Video { tone, download } => run_video(ctx, tone, download.as_deref()).await,
        Command::Interactive => run_interactive(ctx).await,
        Command::Cache { action } => run_cache(ctx, action),
        Command::Config { action } => run_config(ctx, action),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub platform: Option<PlatformArg>,
    pub tone: Option<ToneArg>,
    pub no_cache: bool,
    pub json: bool,
}

/// Generate content for text and/or an image and make it the current session.
pub async fn run_generate(
    ctx: &Context,
    text: Option<String>,
    image: Option<&Path>,
    options: GenerateOptions,
) -> Result<(), String> {
    let input = match image {
        Some(path) => InputData::from_image_file(path, text.as_deref()),
        None => Ok(InputData::text(text.unwrap_or_default())),
    }
    .map_err(|e| e.to_string())?;
    input.validate().map_err(|e| e.to_string())?;

    let engine = ctx.engine()?;
    let mut store = ContentStore::new();
    let ticket = store.begin_generation();
    eprintln!("Crafting viral content...");
    let result = engine.generate(&input, !options.no_cache).await;
    if let Applied::Failed = store.complete_generation(ticket, result) {
        return Err(store
            .error()
            .unwrap_or(GENERATION_FAILED_MESSAGE)
            .to_string());
    }

    let defaults = ViewState::new(ctx.config.ui.default_platform, ctx.config.ui.default_tone);
    let view = Context::view_state(defaults, options.platform, options.tone);
    ctx.save(&store, &view)?;

    if options.json {
        let content = store
            .working()
            .ok_or_else(|| "Generation produced no content".to_string())?;
        let json = serde_json::to_string_pretty(content)
            .map_err(|e| format!("Failed to serialize content: {}", e))?;
        println!("{}", json);
    } else {
        println!("{}", view::render(&store, &view));
    }
    Ok(())
}

pub fn run_show(
    ctx: &Context,
    platform: Option<PlatformArg>,
    tone: Option<ToneArg>,
) -> Result<(), String> {
    let (store, saved) = ctx.load_session()?.into_parts();
    let view = Context::view_state(saved, platform, tone);
    if view != saved {
        ctx.save(&store, &view)?;
    }
    println!("{}", view::render(&store, &view));
    Ok(())
}

pub fn run_copy(
    ctx: &Context,
    platform: Option<PlatformArg>,
    tone: Option<ToneArg>,
) -> Result<(), String> {
    let (store, saved) = ctx.load_session()?.into_parts();
    let view = Context::view_state(saved, platform, tone);
    let content = store
        .working()
        .ok_or_else(|| "Nothing to copy yet.".to_string())?;
    println!("{}", view::copy_text(content, &view));
    Ok(())
}

/// Apply one edit to the saved working copy.
pub fn run_edit(ctx: &Context, field: EditField, tone: Option<ToneArg>) -> Result<(), String> {
    let edit = field.into_edit()?;
    let (mut store, saved) = ctx.load_session()?.into_parts();
    let mut view = Context::view_state(saved, None, tone);

    view.select_platform(edit.platform());
    store
        .apply_edit(view.tone, edit)
        .map_err(|e| e.to_string())?;
    ctx.save(&store, &view)?;

    println!("{}", view::render(&store, &view));
    Ok(())
}

/// Generate the preview video for the saved script.
pub async fn run_video(
    ctx: &Context,
    tone: Option<ToneArg>,
    download: Option<&Path>,
) -> Result<(), String> {
    let (mut store, saved) = ctx.load_session()?.into_parts();
    let mut view = Context::view_state(saved, None, tone);
    view.select_platform(Platform::Video);

    let script = store
        .working()
        .map(|c| c.variations.get(view.tone).video_script.clone())
        .ok_or_else(|| "No content yet. Run `viral generate` first.".to_string())?;
    let client = ctx.client()?;

    let ticket = store.begin_video().map_err(|e| e.to_string())?;
    eprintln!("Generating preview video. This can take a few minutes...");
    let result = client.generate_video_for_script(&script).await;
    if let Err(e) = &result {
        eprintln!("{}", e);
    }
    store.complete_video(ticket, result);

    let uri = match store.video_url() {
        Some(uri) => uri.to_string(),
        None => {
            return Err(store
                .video_error()
                .unwrap_or(VIDEO_FAILED_MESSAGE)
                .to_string())
        }
    };
    ctx.save(&store, &view)?;
    println!("Preview video (720p, 9:16): {}", client.playable(&uri));

    if let Some(dest) = download {
        let path = client
            .download_video(&uri, dest)
            .await
            .map_err(|e| format!("Failed to download video: {}", e))?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

/// Interactive console, resuming the saved session if there is one.
pub async fn run_interactive(ctx: &Context) -> Result<(), String> {
    let engine = Arc::new(ctx.engine()?);
    let defaults = ViewState::new(ctx.config.ui.default_platform, ctx.config.ui.default_tone);

    let (store, view) = match Session::load(&ctx.session_path) {
        Ok(Some(session)) => session.into_parts(),
        Ok(None) => (ContentStore::new(), defaults),
        Err(e) => {
            eprintln!("Warning: {}", e);
            eprintln!("Starting a new session.\n");
            (ContentStore::new(), defaults)
        }
    };

    event_loop::run(engine, store, view, Some(ctx.session_path.clone())).await
}

/// Format bytes as human-readable string (KB, MB, GB)
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn run_cache(ctx: &Context, action: CacheAction) -> Result<(), String> {
    let cache = ContentCache::new(ctx.config.cache.dir());

    match action {
        CacheAction::List => {
            let entries = cache
                .list_entries()
                .map_err(|e| format!("Failed to list cache entries: {}", e))?;

            if entries.is_empty() {
                println!("Cache is empty.");
                return Ok(());
            }

            println!("Cached content:\n");
            for entry in &entries {
                let text = entry
                    .input_text
                    .as_deref()
                    .map(|t| {
                        let short = truncate_chars(t, 47);
                        if short.len() < t.len() {
                            format!("{}...", short)
                        } else {
                            t.to_string()
                        }
                    })
                    .unwrap_or_else(|| "(no input data)".to_string());

                println!(
                    "  {} {} \"{}\"",
                    entry.hash,
                    format_size(entry.size_bytes),
                    text
                );
            }

            let total_size = cache
                .total_size_bytes()
                .map_err(|e| format!("Failed to calculate total size: {}", e))?;
            println!(
                "\nTotal: {} entries, {}",
                entries.len(),
                format_size(total_size)
            );
            Ok(())
        }
        CacheAction::Clear { hash: Some(hash) } => {
            let removed = cache
                .remove(&hash)
                .map_err(|e| format!("Failed to remove cached content: {}", e))?;
            if removed {
                println!("Removed cached content: {}", hash);
            } else {
                println!("No cached content found with hash: {}", hash);
            }
            Ok(())
        }
        CacheAction::Clear { hash: None } => {
            let count = cache
                .clear_all()
                .map_err(|e| format!("Failed to clear cache: {}", e))?;
            if count == 0 {
                println!("Cache is already empty.");
            } else {
                println!(
                    "Removed {} cached entr{}.",
                    count,
                    if count == 1 { "y" } else { "ies" }
                );
            }
            Ok(())
        }
    }
}

pub fn run_config(ctx: &Context, action: ConfigAction) -> Result<(), String> {
    let config_path = ctx
        .config_path
        .clone()
        .unwrap_or_else(config::default_path);

    match action {
        ConfigAction::Show => {
            println!("Current configuration:\n");
            println!("{}", ctx.config.to_toml().map_err(|e| e.to_string())?);
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            println!("Session file: {}", ctx.session_path.display());
            Ok(())
        }
        ConfigAction::Init => {
            Config::default()
                .write_new(&config_path)
                .map_err(|e| format!("{}\nUse 'viral config show' to view current settings.", e))?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
