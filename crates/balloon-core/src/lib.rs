// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Balloon message exchange.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Balloon workspace. Storage backends and
//! channel adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BalloonError;
pub use types::{
    AdapterType, Channel, Conditional, HealthStatus, MessageId, ReadConsistency, ThreadId, UserId,
};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, Clock, PluginAdapter, StorageAdapter, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutgoingMessage, Question};

    #[test]
    fn balloon_error_has_all_variants() {
        let _config = BalloonError::Config("test".into());
        let _storage = BalloonError::storage(std::io::Error::other("test"));
        let _channel = BalloonError::Channel {
            message: "test".into(),
            source: None,
        };
        let _timeout = BalloonError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _internal = BalloonError::Internal("test".into());
    }

    #[test]
    fn only_store_and_timeout_failures_are_transient() {
        assert!(BalloonError::storage("down").is_transient());
        assert!(
            BalloonError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(!BalloonError::Config("bad".into()).is_transient());
        assert!(!BalloonError::Internal("bug".into()).is_transient());
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Channel, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn user_id_composes_platform_and_native_id() {
        let id = UserId::new("telegram", 4242);
        assert_eq!(id.as_str(), "telegram 4242");
        assert_eq!(id.native_id(), "4242");

        let bare = UserId("local".into());
        assert_eq!(bare.native_id(), "local");
    }

    #[test]
    fn channel_renders_as_hashtags() {
        let channel = Channel("fr paris".into());
        assert_eq!(channel.tags().collect::<Vec<_>>(), vec!["fr", "paris"]);
        assert_eq!(channel.to_hashtags(), "#fr #paris");
    }

    #[test]
    fn question_serializes_as_name_and_params() {
        let q = Question::Reply {
            thread: ThreadId("abc".into()),
        };
        let json = serde_json::to_value(&q).expect("should serialize");
        assert_eq!(
            json,
            serde_json::json!({"name": "reply", "params": {"thread": "abc"}})
        );
        let back: Question = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(back, q);

        let json = serde_json::to_value(Question::NewMessage).expect("should serialize");
        assert_eq!(json, serde_json::json!({"name": "new_message"}));
    }

    #[test]
    fn conditional_helpers() {
        let applied: Conditional<u32> = Conditional::Applied(3);
        assert!(applied.is_applied());
        assert_eq!(applied.clone().map(|n| n + 1), Conditional::Applied(4));
        assert_eq!(applied.applied(), Some(3));

        let failed: Conditional<u32> = Conditional::GuardFailed;
        assert!(!failed.is_applied());
        assert_eq!(failed.map(|n| n + 1), Conditional::GuardFailed);
    }

    #[test]
    fn outgoing_message_builder() {
        let msg = OutgoingMessage::new(UserId::new("telegram", 1), "hi")
            .with_thread(ThreadId("t".into()))
            .markdown();
        assert_eq!(msg.text, "hi");
        assert!(msg.markdown);
        assert!(msg.buttons.is_empty());
        assert_eq!(msg.thread, Some(ThreadId("t".into())));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
