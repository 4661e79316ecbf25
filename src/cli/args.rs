//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{PlatformArg, ToneArg};
use crate::store::Edit;

/// Turn one idea into a multi-platform content pack
#[derive(Parser, Debug)]
#[command(name = "viral")]
#[command(
    version,
    about = "Generate tweet threads, posts, video scripts and articles from one idea",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate content from text and/or an image
    Generate {
        /// Topic, link or notes
        text: Option<String>,

        /// Image to analyze (png, jpeg, webp, heic, heif, gif)
        #[arg(long, short)]
        image: Option<PathBuf>,

        /// Platform tab to show
        #[arg(long, short)]
        platform: Option<PlatformArg>,

        /// Tone variation to show
        #[arg(long, short)]
        tone: Option<ToneArg>,

        /// Skip the content cache lookup
        #[arg(long)]
        no_cache: bool,

        /// Print the raw content bundle as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current content
    Show {
        #[arg(long, short)]
        platform: Option<PlatformArg>,
        #[arg(long, short)]
        tone: Option<ToneArg>,
    },
    /// Print the current tab as plain text
    Copy {
        #[arg(long, short)]
        platform: Option<PlatformArg>,
        #[arg(long, short)]
        tone: Option<ToneArg>,
    },
    /// Replace one field of the current content
    Edit {
        #[command(subcommand)]
        field: EditField,

        /// Tone variation to edit (default: the selected tone)
        #[arg(long, short, global = true)]
        tone: Option<ToneArg>,
    },
    /// Generate the preview video for the current video script
    Video {
        #[arg(long, short)]
        tone: Option<ToneArg>,

        /// Also download the video to this path
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// Interactive session
    Interactive,
    /// Content cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum EditField {
    /// Replace tweet N (numbered from 1)
    Tweet { number: usize, text: String },
    Linkedin { text: String },
    Facebook { text: String },
    Article { text: String },
    /// Video hook
    Hook { text: String },
    /// Video script body
    Body { text: String },
    /// Video call to action
    Cta { text: String },
    /// Video visual direction
    Visuals { text: String },
}

impl EditField {
    pub fn into_edit(self) -> Result<Edit, String> {
        Ok(match self {
            EditField::Tweet { number: 0, .. } => {
                return Err("Tweets are numbered from 1".to_string())
            }
            EditField::Tweet { number, text } => Edit::Tweet {
                index: number - 1,
                text,
            },
            EditField::Linkedin { text } => Edit::LinkedIn(text),
            EditField::Facebook { text } => Edit::Facebook(text),
            EditField::Article { text } => Edit::Article(text),
            EditField::Hook { text } => Edit::VideoHook(text),
            EditField::Body { text } => Edit::VideoBody(text),
            EditField::Cta { text } => Edit::VideoCallToAction(text),
            EditField::Visuals { text } => Edit::VideoVisualCues(text),
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    /// List cached content
    List,
    /// Remove one entry by hash, or everything
    Clear { hash: Option<String> },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let args = Args::parse_from(["viral", "generate", "AI is changing jobs"]);
        match args.command {
            Command::Generate {
                text,
                image,
                platform,
                tone,
                no_cache,
                json,
            } => {
                assert_eq!(text.as_deref(), Some("AI is changing jobs"));
                assert!(image.is_none());
                assert!(platform.is_none());
                assert!(tone.is_none());
                assert!(!no_cache);
                assert!(!json);
            }
            _ => panic!("Expected Generate subcommand"),
        }
        assert!(args.config.is_none());
    }

    #[test]
    fn test_generate_with_image_and_flags() {
        let args = Args::parse_from([
            "viral",
            "generate",
            "--image",
            "photo.png",
            "-p",
            "linkedin",
            "-t",
            "wise",
            "--no-cache",
            "--json",
        ]);
        match args.command {
            Command::Generate {
                text,
                image,
                platform,
                tone,
                no_cache,
                json,
            } => {
                assert!(text.is_none());
                assert_eq!(image, Some(PathBuf::from("photo.png")));
                assert_eq!(platform, Some(PlatformArg::Linkedin));
                assert_eq!(tone, Some(ToneArg::Wise));
                assert!(no_cache);
                assert!(json);
            }
            _ => panic!("Expected Generate subcommand"),
        }
    }

    #[test]
    fn test_global_config_option() {
        let args = Args::parse_from(["viral", "show", "--config", "/tmp/config.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/config.toml")));

        let args = Args::parse_from(["viral", "-c", "/tmp/test.toml", "interactive"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(matches!(args.command, Command::Interactive));
    }

    #[test]
    fn test_edit_tweet_with_tone() {
        let args = Args::parse_from(["viral", "edit", "tweet", "2", "New text", "--tone", "casual"]);
        match args.command {
            Command::Edit { field, tone } => {
                assert_eq!(tone, Some(ToneArg::Casual));
                assert_eq!(
                    field.into_edit().unwrap(),
                    Edit::Tweet {
                        index: 1,
                        text: "New text".to_string()
                    }
                );
            }
            _ => panic!("Expected Edit subcommand"),
        }
    }

    #[test]
    fn test_edit_tweet_zero_is_rejected() {
        let field = EditField::Tweet {
            number: 0,
            text: "x".to_string(),
        };
        assert!(field.into_edit().is_err());
    }

    #[test]
    fn test_edit_video_fields() {
        let args = Args::parse_from(["viral", "edit", "cta", "Follow for more"]);
        match args.command {
            Command::Edit { field, tone } => {
                assert!(tone.is_none());
                assert_eq!(
                    field.into_edit().unwrap(),
                    Edit::VideoCallToAction("Follow for more".to_string())
                );
            }
            _ => panic!("Expected Edit subcommand"),
        }
    }

    #[test]
    fn test_video_download_option() {
        let args = Args::parse_from(["viral", "video", "--download", "/tmp/out.mp4"]);
        match args.command {
            Command::Video { tone, download } => {
                assert!(tone.is_none());
                assert_eq!(download, Some(PathBuf::from("/tmp/out.mp4")));
            }
            _ => panic!("Expected Video subcommand"),
        }
    }

    #[test]
    fn test_cache_subcommands() {
        let args = Args::parse_from(["viral", "cache", "list"]);
        assert!(matches!(
            args.command,
            Command::Cache {
                action: CacheAction::List
            }
        ));

        let args = Args::parse_from(["viral", "cache", "clear", "abc123"]);
        match args.command {
            Command::Cache {
                action: CacheAction::Clear { hash },
            } => assert_eq!(hash.as_deref(), Some("abc123")),
            _ => panic!("Expected Cache Clear subcommand"),
        }
    }

    #[test]
    fn test_config_subcommands() {
        let args = Args::parse_from(["viral", "config", "init"]);
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Init
            }
        ));
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(Args::try_parse_from(["viral", "show", "--platform", "myspace"]).is_err());
    }
}
