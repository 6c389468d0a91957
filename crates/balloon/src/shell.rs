// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balloon shell` command implementation.
//!
//! A local channel adapter: lines typed at a readline prompt become inbound
//! events, and outgoing messages are printed with their recipient. Several
//! local users can take turns with `/as NAME`, which is enough to play both
//! sides of an exchange from one terminal.

use std::sync::Mutex as StdMutex;
use std::sync::mpsc as std_mpsc;

use async_trait::async_trait;
use balloon_config::BalloonConfig;
use balloon_core::types::{
    AdapterType, HealthStatus, IncomingButtonCallback, IncomingCommand, IncomingEvent,
    IncomingMessage, OutgoingMessage,
};
use balloon_core::{BalloonError, ChannelAdapter, PluginAdapter, StorageAdapter, UserId};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::commands::open_exchange;

/// Platform name of shell users.
pub const PLATFORM: &str = "shell";

/// Longest button command the shell accepts as a `!payload` line.
const MAX_COMMAND_LEN: usize = 64;

/// What one typed line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Event(IncomingEvent),
    /// `/as NAME`: continue as another local user.
    SwitchUser(String),
    Quit,
    Empty,
}

/// Interpret a typed line on behalf of `user`.
pub fn parse_line(line: &str, user: &str, display_name: &str) -> ShellInput {
    let trimmed = line.trim();
    let id = UserId::new(PLATFORM, user);

    if trimmed.is_empty() {
        return ShellInput::Empty;
    }
    if trimmed == "/quit" || trimmed == "/exit" {
        return ShellInput::Quit;
    }
    if let Some(name) = trimmed.strip_prefix("/as ") {
        let name = name.trim();
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            return ShellInput::SwitchUser(name.to_string());
        }
    }
    if let Some(payload) = trimmed.strip_prefix('!') {
        return ShellInput::Event(IncomingEvent::ButtonCallback(IncomingButtonCallback {
            user: id,
            payload: payload.trim().to_string(),
            original_message: None,
        }));
    }
    if trimmed.starts_with('/') {
        return ShellInput::Event(IncomingEvent::Command(IncomingCommand {
            user: id,
            text: trimmed.to_string(),
        }));
    }
    ShellInput::Event(IncomingEvent::Message(IncomingMessage {
        user: id,
        display_name: display_name.to_string(),
        text: trimmed.to_string(),
        reply_to: None,
    }))
}

/// Render an outgoing message for the terminal.
pub fn render(message: &OutgoingMessage) -> String {
    let mut out = format!(
        "{} {}\n{}",
        "to".dimmed(),
        message.recipient.native_id().bold(),
        message.text
    );
    for button in &message.buttons {
        out.push_str(&format!(
            "\n  [{}] {}",
            button.label.cyan(),
            format!("!{}", button.command).dimmed()
        ));
    }
    out
}

/// Channel adapter fed by the readline thread.
///
/// Every call to `receive` first signals the reader that the previous event
/// is fully handled, so the prompt never overlaps with output.
struct ShellChannel {
    events: Mutex<mpsc::Receiver<IncomingEvent>>,
    ready: StdMutex<std_mpsc::Sender<()>>,
}

#[async_trait]
impl PluginAdapter for ShellChannel {
    fn name(&self) -> &str {
        "shell"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BalloonError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BalloonError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ShellChannel {
    fn max_command_len(&self) -> usize {
        MAX_COMMAND_LEN
    }

    async fn send(&self, msg: OutgoingMessage) -> Result<String, BalloonError> {
        println!("{}\n", render(&msg));
        Ok(uuid::Uuid::new_v4().simple().to_string())
    }

    async fn receive(&self) -> Result<Option<IncomingEvent>, BalloonError> {
        if let Ok(ready) = self.ready.lock() {
            // The reader may already be gone; then no event will follow either.
            let _ = ready.send(());
        }
        Ok(self.events.lock().await.recv().await)
    }
}

/// Runs the `balloon shell` interactive REPL.
pub async fn run_shell(
    config: BalloonConfig,
    user: String,
    display_name: Option<String>,
) -> Result<(), BalloonError> {
    let (exchange, storage) = open_exchange(&config).await?;

    let (event_tx, event_rx) = mpsc::channel(1);
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let channel = ShellChannel {
        events: Mutex::new(event_rx),
        ready: StdMutex::new(ready_tx),
    };

    println!("{}", "balloon shell".bold().green());
    println!(
        "Type a message, {} for commands, {} to press a button, {} to switch user, {} to exit.\n",
        "/help".yellow(),
        "!command".yellow(),
        "/as NAME".yellow(),
        "/quit".yellow()
    );

    let reader = tokio::task::spawn_blocking(move || {
        read_lines(user, display_name, &event_tx, &ready_rx)
    });

    balloon_exchange::pump(&channel, &exchange, CancellationToken::new()).await?;
    reader
        .await
        .map_err(|e| BalloonError::Internal(format!("shell reader failed: {e}")))??;

    storage.close().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// The blocking readline loop. Returns when the user quits.
fn read_lines(
    mut user: String,
    mut display_name: Option<String>,
    events: &mpsc::Sender<IncomingEvent>,
    ready: &std_mpsc::Receiver<()>,
) -> Result<(), BalloonError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| BalloonError::Internal(format!("failed to initialize readline: {e}")))?;

    loop {
        // Wait until the exchange asks for the next event.
        if ready.recv().is_err() {
            return Ok(());
        }

        let event = loop {
            let prompt = format!("{}> ", user.green());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let name = display_name.clone().unwrap_or_else(|| user.clone());
                    match parse_line(&line, &user, &name) {
                        ShellInput::Empty => continue,
                        ShellInput::Quit => return Ok(()),
                        ShellInput::SwitchUser(name) => {
                            debug!(user = %name, "switched local user");
                            user = name;
                            display_name = None;
                            continue;
                        }
                        ShellInput::Event(event) => {
                            let _ = rl.add_history_entry(line.as_str());
                            break event;
                        }
                    }
                }
                // Ctrl+C or Ctrl+D
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
                Err(e) => {
                    return Err(BalloonError::Channel {
                        message: format!("readline failed: {e}"),
                        source: None,
                    });
                }
            }
        };

        if events.blocking_send(event).is_err() {
            return Ok(());
        }
    }
}
