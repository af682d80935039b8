//! Tracing setup for the engine and the CLI.
//!
//! Logs always go to stderr: in worker mode stdout carries exactly one
//! JSON response.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Used when neither `RUST_LOG` nor the configured level parses.
const FALLBACK_LEVEL: &str = "info";

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let env = std::env::var("RUST_LOG").ok();
    let filter = level_filter(env.as_deref(), &config.level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(true)
            .compact()
            .try_init()
    };
    installed.is_ok()
}

/// `RUST_LOG` wins over the configured level; unparseable directives are skipped.
fn level_filter(env: Option<&str>, configured: &str) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_LEVEL))
}
