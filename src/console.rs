//! Console - line-oriented input for the interactive session.
//!
//! Plain text is a generation request. Slash commands switch tabs and
//! tones, edit individual fields, and trigger the preview video.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use tokio::sync::mpsc;

use crate::content::{Platform, Tone};
use crate::store::Edit;

pub const HELP: &str = "\
Type a topic, link or note and press Enter to generate.

  /image PATH [text]   generate from an image (and optional text)
  /regenerate          ask the model again for the last input
  /platform NAME       twitter, linkedin, facebook, video, article
  /tone NAME           formal, casual, wise
  /tweet N TEXT        replace tweet N of the current tone
  /linkedin TEXT       replace the LinkedIn post
  /facebook TEXT       replace the Facebook post
  /article TEXT        replace the long article
  /hook TEXT           replace the video hook
  /body TEXT           replace the video script body
  /cta TEXT            replace the video call to action
  /visuals TEXT        replace the video visual direction
  /copy                print the current tab as plain text
  /video               generate the preview video
  /reset               discard all edits
  /show                redraw the current view
  /help                show this help
  /quit                exit";

/// A parsed line of console input.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Generate(String),
    Image { path: PathBuf, text: Option<String> },
    Regenerate,
    SelectPlatform(Platform),
    SelectTone(Tone),
    Edit(Edit),
    Copy,
    Video,
    Reset,
    Show,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one line of input.
    ///
    /// Returns `Ok(None)` for blank lines and `Err` with a usage message for
    /// unknown or malformed commands.
    pub fn parse(input: &str) -> Result<Option<Self>, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if !trimmed.starts_with('/') {
            return Ok(Some(ConsoleCommand::Generate(trimmed.to_string())));
        }

        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "/image" => {
                let (path, text) = match rest.split_once(char::is_whitespace) {
                    Some((path, text)) => (path, Some(text.trim().to_string())),
                    None => (rest, None),
                };
                if path.is_empty() {
                    return Err("Usage: /image PATH [text]".to_string());
                }
                ConsoleCommand::Image {
                    path: PathBuf::from(path),
                    text,
                }
            }
            "/platform" => ConsoleCommand::SelectPlatform(rest.parse()?),
            "/tone" => ConsoleCommand::SelectTone(rest.parse()?),
            "/tweet" => {
                let (number, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Usage: /tweet N TEXT".to_string())?;
                let number: usize = number
                    .parse()
                    .map_err(|_| format!("Invalid tweet number '{}'", number))?;
                if number == 0 {
                    return Err("Tweets are numbered from 1".to_string());
                }
                ConsoleCommand::Edit(Edit::Tweet {
                    index: number - 1,
                    text: text.trim().to_string(),
                })
            }
            "/linkedin" => ConsoleCommand::Edit(Edit::LinkedIn(required(name, rest)?)),
            "/facebook" => ConsoleCommand::Edit(Edit::Facebook(required(name, rest)?)),
            "/article" => ConsoleCommand::Edit(Edit::Article(required(name, rest)?)),
            "/hook" => ConsoleCommand::Edit(Edit::VideoHook(required(name, rest)?)),
            "/body" => ConsoleCommand::Edit(Edit::VideoBody(required(name, rest)?)),
            "/cta" => ConsoleCommand::Edit(Edit::VideoCallToAction(required(name, rest)?)),
            "/visuals" => ConsoleCommand::Edit(Edit::VideoVisualCues(required(name, rest)?)),
            "/regenerate" | "/again" => ConsoleCommand::Regenerate,
            "/copy" => ConsoleCommand::Copy,
            "/video" => ConsoleCommand::Video,
            "/reset" => ConsoleCommand::Reset,
            "/show" => ConsoleCommand::Show,
            "/help" | "/?" => ConsoleCommand::Help,
            "/quit" | "/exit" | "/q" => ConsoleCommand::Quit,
            _ => return Err(format!("Unknown command: {} (type /help)", name)),
        };
        Ok(Some(command))
    }
}

fn required(name: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {} TEXT", name))
    } else {
        Ok(rest.to_string())
    }
}

/// A line read from stdin, or its parse failure.
pub type ConsoleInput = Result<ConsoleCommand, String>;

/// Read stdin on a dedicated thread and forward parsed commands.
///
/// The channel closes on EOF or when the receiver is dropped.
pub fn spawn_listener() -> mpsc::UnboundedReceiver<ConsoleInput> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let parsed = match ConsoleCommand::parse(&line) {
                Ok(Some(command)) => Ok(command),
                Ok(None) => {
                    print_prompt();
                    continue;
                }
                Err(message) => Err(message),
            };
            if tx.send(parsed).is_err() {
                break;
            }
        }
    });

    rx
}

pub fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn print_status(message: &str) {
    println!("{}", message);
}

pub fn print_error(message: &str) {
    print_status(&format!("Error: {}", message));
}
