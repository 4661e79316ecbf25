//! Async event loop for the interactive session.
//!
//! Console commands arrive from the stdin reader thread. Generation and
//! video jobs run as spawned tasks and report back over a channel, so the
//! console stays responsive while a request is in flight.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cache::ContentCache;
use crate::console::{self, ConsoleCommand, ConsoleInput, HELP};
use crate::content::{GeneratedContent, InputData};
use crate::gemini::{GeminiClient, GeminiError};
use crate::session::Session;
use crate::store::{Applied, ContentStore, GenerationTicket, VideoTicket};
use crate::view::{self, ViewState};

/// Client plus optional cache, shared by one-shot commands and console tasks.
pub struct Engine {
    client: GeminiClient,
    cache: Option<ContentCache>,
}

impl Engine {
    pub fn new(client: GeminiClient, cache: Option<ContentCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    /// Generate content, answering from the cache when allowed.
    ///
    /// Fresh results are always written back to the cache.
    pub async fn generate(
        &self,
        input: &InputData,
        use_cache: bool,
    ) -> Result<GeneratedContent, GeminiError> {
        let model = self.client.content_model();

        if use_cache {
            if let Some(content) = self.cache.as_ref().and_then(|c| c.get(model, input)) {
                log::info!("Serving content from cache");
                return Ok(content);
            }
        }

        let content = self.client.generate_content(input).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(model, input, &content) {
                log::warn!("Failed to cache content: {}", e);
            }
        }
        Ok(content)
    }
}

/// Completion of a spawned job.
#[derive(Debug)]
pub enum TaskEvent {
    Generated {
        ticket: GenerationTicket,
        result: Result<GeneratedContent, GeminiError>,
    },
    Video {
        ticket: VideoTicket,
        result: Result<String, GeminiError>,
    },
}

/// Whether the loop should keep running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State owned by the interactive session.
pub struct ConsoleState {
    engine: Arc<Engine>,
    store: ContentStore,
    view: ViewState,
    session_path: Option<PathBuf>,
    tasks: mpsc::UnboundedSender<TaskEvent>,
    last_input: Option<InputData>,
}

impl ConsoleState {
    /// Create the state and the receiver for its task completions.
    pub fn new(
        engine: Arc<Engine>,
        store: ContentStore,
        view: ViewState,
        session_path: Option<PathBuf>,
    ) -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tasks, rx) = mpsc::unbounded_channel();
        let state = Self {
            engine,
            store,
            view,
            session_path,
            tasks,
            last_input: None,
        };
        (state, rx)
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn render(&self) {
        println!("{}", view::render(&self.store, &self.view));
    }

    fn save_session(&self) {
        let Some(path) = &self.session_path else {
            return;
        };
        if let Some(session) = Session::capture(&self.store, &self.view) {
            if let Err(e) = session.save(path) {
                log::warn!("Failed to save session: {}", e);
            }
        }
    }

    /// Validate the input and start a generation task.
    ///
    /// A cached bundle for the same input is reused when the engine has a
    /// cache. Use [`ConsoleState::regenerate`] to always ask the model.
    pub fn submit(&mut self, input: InputData) {
        self.start_generation(input, true);
    }

    /// Ask the model again for the last submitted input, skipping the cache.
    pub fn regenerate(&mut self) {
        match self.last_input.clone() {
            Some(input) => self.start_generation(input, false),
            None => console::print_error("Nothing to regenerate yet."),
        }
    }

    fn start_generation(&mut self, input: InputData, use_cache: bool) {
        if let Err(e) = input.validate() {
            console::print_error(&e.to_string());
            return;
        }
        let ticket = match self.store.try_begin_generation() {
            Ok(ticket) => ticket,
            Err(e) => {
                console::print_status(&e.to_string());
                return;
            }
        };

        console::print_status("Crafting viral content...");
        self.last_input = Some(input.clone());
        let engine = Arc::clone(&self.engine);
        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            let result = engine.generate(&input, use_cache).await;
            let _ = tasks.send(TaskEvent::Generated { ticket, result });
        });
    }

    /// Start a video job for the selected tone's script.
    pub fn start_video(&mut self) {
        let tone = self.view.tone;
        let Some(script) = self
            .store
            .working()
            .map(|c| c.variations.get(tone).video_script.clone())
        else {
            console::print_error("No content yet. Generate something first.");
            return;
        };
        let ticket = match self.store.begin_video() {
            Ok(ticket) => ticket,
            Err(e) => {
                console::print_status(&e.to_string());
                return;
            }
        };

        console::print_status("Generating preview video. This can take a few minutes...");
        let engine = Arc::clone(&self.engine);
        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            let result = engine.client().generate_video_for_script(&script).await;
            let _ = tasks.send(TaskEvent::Video { ticket, result });
        });
    }

    pub fn handle_command(&mut self, command: ConsoleCommand) -> Flow {
        match command {
            ConsoleCommand::Generate(text) => self.submit(InputData::text(text)),
            ConsoleCommand::Image { path, text } => {
                match InputData::from_image_file(&path, text.as_deref()) {
                    Ok(input) => self.submit(input),
                    Err(e) => console::print_error(&e.to_string()),
                }
            }
            ConsoleCommand::Regenerate => self.regenerate(),
            ConsoleCommand::SelectPlatform(platform) => {
                self.view.select_platform(platform);
                self.save_session();
                self.render();
            }
            ConsoleCommand::SelectTone(tone) => {
                self.view.select_tone(tone);
                self.save_session();
                self.render();
            }
            ConsoleCommand::Edit(edit) => {
                let platform = edit.platform();
                match self.store.apply_edit(self.view.tone, edit) {
                    Ok(()) => {
                        self.view.select_platform(platform);
                        self.save_session();
                        self.render();
                    }
                    Err(e) => console::print_error(&e.to_string()),
                }
            }
            ConsoleCommand::Copy => match self.store.working() {
                Some(content) => println!("{}", view::copy_text(content, &self.view)),
                None => console::print_error("Nothing to copy yet."),
            },
            ConsoleCommand::Video => self.start_video(),
            ConsoleCommand::Reset => match self.store.reset_edits() {
                Ok(()) => {
                    console::print_status("Edits discarded.");
                    self.save_session();
                    self.render();
                }
                Err(e) => console::print_error(&e.to_string()),
            },
            ConsoleCommand::Show => self.render(),
            ConsoleCommand::Help => console::print_status(HELP),
            ConsoleCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Apply a finished job to the store.
    pub fn handle_event(&mut self, event: TaskEvent) -> Applied {
        match event {
            TaskEvent::Generated { ticket, result } => {
                let applied = self.store.complete_generation(ticket, result);
                match applied {
                    Applied::Updated => {
                        self.save_session();
                        self.render();
                    }
                    Applied::Failed => self.render(),
                    Applied::Stale => {}
                }
                applied
            }
            TaskEvent::Video { ticket, result } => {
                let applied = self.store.complete_video(ticket, result);
                match applied {
                    Applied::Updated => {
                        if let Some(uri) = self.store.video_url() {
                            let url = self.engine.client().playable(uri);
                            console::print_status(&format!("Preview video ready: {}", url));
                        }
                        self.save_session();
                    }
                    Applied::Failed => {
                        if let Some(message) = self.store.video_error() {
                            console::print_error(message);
                        }
                    }
                    Applied::Stale => {}
                }
                applied
            }
        }
    }
}

/// Run the interactive session until `/quit`, EOF or Ctrl+C.
pub async fn run(
    engine: Arc<Engine>,
    store: ContentStore,
    view: ViewState,
    session_path: Option<PathBuf>,
) -> Result<(), String> {
    let (mut state, mut task_rx) = ConsoleState::new(engine, store, view, session_path);
    let mut commands = console::spawn_listener();

    let (quit_tx, mut quit_rx) = mpsc::unbounded_channel::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = quit_tx.send(());
    }) {
        log::warn!("Could not set up Ctrl+C handler: {}", e);
    }

    if state.store().working().is_some() {
        state.render();
    } else {
        console::print_status(HELP);
    }
    console::print_prompt();

    loop {
        tokio::select! {
            maybe_input = commands.recv() => {
                let input: ConsoleInput = match maybe_input {
                    Some(input) => input,
                    // stdin closed
                    None => break,
                };
                match input {
                    Ok(command) => {
                        if state.handle_command(command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(message) => console::print_error(&message),
                }
                console::print_prompt();
            }

            Some(event) = task_rx.recv() => {
                state.handle_event(event);
                console::print_prompt();
            }

            _ = quit_rx.recv() => {
                println!();
                break;
            }
        }
    }

    log::info!("Interactive session ended");
    Ok(())
}
