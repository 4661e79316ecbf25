//! viral-engine library crate.
//!
//! Turns one piece of text or an image into a multi-platform content pack
//! using Gemini, with an optional Veo preview video. Exposed as a library
//! for the `viral` binary and for integration testing.

pub mod cache;
pub mod cli;
pub mod config;
pub mod console;
pub mod content;
pub mod event_loop;
pub mod gemini;
pub mod session;
pub mod store;
pub mod view;
