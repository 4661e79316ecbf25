use clap::Parser;
use viral_engine::cli::{self, Args};
use viral_engine::gemini::{API_KEY_ENV, GEMINI_API_KEY_ENV};

/// Load environment variables from .env file.
/// Logs a warning if no API key is set.
fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    if std::env::var(GEMINI_API_KEY_ENV).is_err() && std::env::var(API_KEY_ENV).is_err() {
        log::warn!(
            "Neither {} nor {} is set; generation commands will fail",
            GEMINI_API_KEY_ENV,
            API_KEY_ENV
        );
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("viral_engine=info,viral=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    load_env();

    let args = Args::parse();

    if let Err(e) = cli::run(args.command, args.config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
