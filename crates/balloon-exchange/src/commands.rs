// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command parsing.
//!
//! Commands arrive typed by users (`/help`) or as button payloads
//! (`reply/<thread>`). Both use the same grammar: a name, optionally followed
//! by `/` and one argument. A leading `:` marks an alias id instead.

use std::fmt;

use balloon_core::{MessageId, ThreadId};

use crate::alias::ALIAS_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `letsgo` or `new`: the next message is a new message.
    NewMessage,
    Status,
    Trending,
    Reply(ThreadId),
    SendBack(MessageId),
    /// An alias id to resolve before dispatching.
    Alias(String),
    /// Anything else, with the original text.
    Unknown(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed).trim();

        if let Some(id) = body.strip_prefix(ALIAS_PREFIX) {
            return if id.is_empty() {
                Self::Unknown(trimmed.to_string())
            } else {
                Self::Alias(id.to_string())
            };
        }

        let (name, arg) = match body.split_once('/') {
            Some((name, arg)) => (name, Some(arg)),
            None => (body, None),
        };

        match (name.to_ascii_lowercase().as_str(), arg) {
            ("start", None) => Self::Start,
            ("help", None) => Self::Help,
            ("letsgo" | "new", None) => Self::NewMessage,
            ("status", None) => Self::Status,
            ("trending", None) => Self::Trending,
            ("reply", Some(id)) if is_id(id) => Self::Reply(ThreadId(id.to_string())),
            ("sendback", Some(id)) if is_id(id) => Self::SendBack(MessageId(id.to_string())),
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

fn is_id(arg: &str) -> bool {
    !arg.is_empty() && arg.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// The canonical command string, as used in button payloads.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Help => f.write_str("help"),
            Self::NewMessage => f.write_str("letsgo"),
            Self::Status => f.write_str("status"),
            Self::Trending => f.write_str("trending"),
            Self::Reply(thread) => write!(f, "reply/{thread}"),
            Self::SendBack(message) => write!(f, "sendback/{message}"),
            Self::Alias(id) => write!(f, "{ALIAS_PREFIX}{id}"),
            Self::Unknown(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_and_case_are_ignored() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("  HELP "), Command::Help);
        assert_eq!(Command::parse("/new"), Command::NewMessage);
        assert_eq!(Command::parse("letsgo"), Command::NewMessage);
        assert_eq!(Command::parse("/Trending"), Command::Trending);
    }

    #[test]
    fn arguments_are_parsed() {
        assert_eq!(
            Command::parse("reply/abc123"),
            Command::Reply(ThreadId("abc123".into()))
        );
        assert_eq!(
            Command::parse("/sendback/ff00"),
            Command::SendBack(MessageId("ff00".into()))
        );
        assert_eq!(Command::parse(":0a1b"), Command::Alias("0a1b".into()));
    }

    #[test]
    fn malformed_arguments_are_unknown() {
        assert_eq!(
            Command::parse("/reply/"),
            Command::Unknown("/reply/".into())
        );
        assert_eq!(
            Command::parse("reply/a b"),
            Command::Unknown("reply/a b".into())
        );
        assert_eq!(Command::parse("help/me"), Command::Unknown("help/me".into()));
        assert_eq!(Command::parse(":"), Command::Unknown(":".into()));
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".into()));
    }

    #[test]
    fn display_is_parseable() {
        for command in [
            Command::Start,
            Command::Help,
            Command::NewMessage,
            Command::Status,
            Command::Trending,
            Command::Reply(ThreadId::generate()),
            Command::SendBack(MessageId::generate()),
            Command::Alias("abcd".into()),
        ] {
            assert_eq!(Command::parse(&command.to_string()), command);
        }
    }
}
