//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, CacheAction, Command, ConfigAction, EditField};
pub use commands::{
    execute, run, run_cache, run_config, run_copy, run_edit, run_generate, run_interactive,
    run_show, run_video, Context, GenerateOptions,
};
pub use enums::{PlatformArg, ToneArg};
