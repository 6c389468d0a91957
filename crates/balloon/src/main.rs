// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Balloon - anonymous hashtag message exchange.
//!
//! This is the binary entry point: a local shell adapter plus inspection
//! commands over the configured database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Balloon - anonymous hashtag message exchange.
#[derive(Parser, Debug)]
#[command(name = "balloon", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the exchange from the terminal, as one or more local users.
    Shell {
        /// Local user to start as.
        #[arg(long, default_value = "local")]
        user: String,
        /// Name shown to people receiving your messages.
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Print the trending hashtags.
    Trending,
    /// Print the credit balance of a user.
    Status {
        /// Platform-native user id.
        user: String,
        /// Platform the user id belongs to.
        #[arg(long, default_value = shell::PLATFORM)]
        platform: String,
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => balloon_config::load_and_validate_path(path),
        None => balloon_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            balloon_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.bot.log_level);

    let result = match cli.command {
        Some(Commands::Shell { user, display_name }) => {
            shell::run_shell(config, user, display_name).await
        }
        Some(Commands::Trending) => commands::run_trending(&config).await,
        Some(Commands::Status {
            user,
            platform,
            json,
        }) => commands::run_status(&config, &platform, &user, json).await,
        None => {
            println!("balloon: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so they do not interleave with shell output on stdout.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("balloon={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
