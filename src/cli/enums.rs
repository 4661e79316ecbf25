//! CLI enum types for platform and tone options.

use clap::ValueEnum;

use crate::content::{Platform, Tone};

/// Platform tab to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlatformArg {
    #[default]
    #[value(alias = "x")]
    Twitter,
    Linkedin,
    Facebook,
    #[value(aliases = ["tiktok", "reels"])]
    Video,
    Article,
}

impl From<PlatformArg> for Platform {
    fn from(p: PlatformArg) -> Self {
        match p {
            PlatformArg::Twitter => Platform::Twitter,
            PlatformArg::Linkedin => Platform::LinkedIn,
            PlatformArg::Facebook => Platform::Facebook,
            PlatformArg::Video => Platform::Video,
            PlatformArg::Article => Platform::Article,
        }
    }
}

/// Tone variation to show or edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ToneArg {
    #[default]
    Formal,
    Casual,
    Wise,
}

impl From<ToneArg> for Tone {
    fn from(t: ToneArg) -> Self {
        match t {
            ToneArg::Formal => Tone::Formal,
            ToneArg::Casual => Tone::Casual,
            ToneArg::Wise => Tone::Wise,
        }
    }
}
