// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The loop connecting a channel adapter to the exchange.

use balloon_core::{BalloonError, ChannelAdapter, PluginAdapter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::exchange::Exchange;

/// Feed events from `channel` through `exchange` until the channel closes or
/// `cancel` fires.
///
/// A failed event is logged and skipped, as is a failed send. Button commands
/// are compacted to the channel's own command limit before sending. A receive
/// error ends the loop and is returned.
pub async fn pump(
    channel: &dyn ChannelAdapter,
    exchange: &Exchange,
    cancel: CancellationToken,
) -> Result<(), BalloonError> {
    info!(channel = channel.name(), "channel pump running");
    let limit = channel.max_command_len();

    loop {
        let event = tokio::select! {
            received = channel.receive() => received?,
            _ = cancel.cancelled() => {
                info!("shutdown signal received, stopping channel pump");
                break;
            }
        };
        let Some(event) = event else {
            debug!("channel closed");
            break;
        };

        let outgoing = match exchange.handle(event).await {
            Ok(outgoing) => outgoing,
            Err(e) => {
                error!(error = %e, transient = e.is_transient(), "failed to handle event");
                continue;
            }
        };

        for message in outgoing {
            let recipient = message.recipient.clone();
            let sent = match exchange.compact_buttons(message, limit).await {
                Ok(message) => channel.send(message).await,
                Err(e) => Err(e),
            };
            if let Err(e) = sent {
                error!(error = %e, recipient = %recipient, "failed to send message");
            }
        }
    }

    info!(channel = channel.name(), "channel pump stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use balloon_config::BalloonConfig;
    use balloon_core::UserId;
    use balloon_core::types::{IncomingCommand, IncomingEvent, IncomingMessage};
    use balloon_test_utils::{ManualClock, MemoryStore, MockChannel};

    fn exchange(store: Arc<MemoryStore>) -> Exchange {
        Exchange::new(store, Arc::new(ManualClock::fixed()), &BalloonConfig::default())
    }

    fn say(name: &str, text: &str) -> IncomingEvent {
        IncomingEvent::Message(IncomingMessage {
            user: UserId::new("mock", name),
            display_name: name.to_string(),
            text: text.to_string(),
            reply_to: None,
        })
    }

    #[tokio::test]
    async fn drains_channel_and_sends_replies() {
        let store = Arc::new(MemoryStore::new());
        let exchange = exchange(store);
        let channel = MockChannel::new();
        channel.inject(say("alice", "hello #fr")).await;
        channel.inject(say("bob", "salut #fr")).await;
        channel.close().await;

        pump(&channel, &exchange, CancellationToken::new())
            .await
            .unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].recipient, UserId::new("mock", "bob"));
        assert!(sent[1].text.contains("hello #fr"));
    }

    #[tokio::test]
    async fn buttons_fit_the_channel_limit() {
        let store = Arc::new(MemoryStore::new());
        let exchange = exchange(store);
        let channel = MockChannel::with_command_limit(36);
        channel.inject(say("alice", "hello #fr")).await;
        channel.inject(say("bob", "salut #fr")).await;
        channel.close().await;

        pump(&channel, &exchange, CancellationToken::new())
            .await
            .unwrap();

        let sent = channel.sent_messages().await;
        assert!(sent[1].buttons.iter().all(|b| b.command.len() < 36));
        assert!(sent[1].buttons[0].command.starts_with(':'));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn aliases_are_not_aliased_again_under_a_tight_limit() {
        let mut config = BalloonConfig::default();
        config.aliases.command_limit = 34;
        let exchange = Exchange::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::fixed()),
            &config,
        );
        let channel = MockChannel::with_command_limit(20);
        channel.inject(say("alice", "hello #fr")).await;
        channel.inject(say("bob", "salut #fr")).await;
        channel.close().await;

        pump(&channel, &exchange, CancellationToken::new())
            .await
            .unwrap();

        let sent = channel.sent_messages().await;
        let reply = &sent[1].buttons[0].command;
        assert_eq!(reply.len(), 33);
        assert!(logs_contain("aliased command does not fit the platform limit"));

        let pressed = exchange
            .handle(IncomingEvent::Command(IncomingCommand {
                user: UserId::new("mock", "bob"),
                text: reply.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(pressed[0].text, crate::messages::TYPE_REPLY);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_event_is_logged_and_skipped() {
        let store = Arc::new(MemoryStore::new());
        let exchange = exchange(store.clone());
        let channel = MockChannel::new();
        store.set_unavailable(true);
        channel.inject(say("alice", "hello")).await;
        channel.close().await;

        pump(&channel, &exchange, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(channel.sent_count().await, 0);
        assert!(logs_contain("failed to handle event"));
    }

    #[tokio::test]
    async fn cancellation_stops_an_idle_pump() {
        let exchange = exchange(Arc::new(MemoryStore::new()));
        let channel = MockChannel::new();
        channel
            .inject(IncomingEvent::Command(IncomingCommand {
                user: UserId::new("mock", "alice"),
                text: "/help".into(),
            }))
            .await;
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();

        let (result, ()) = tokio::join!(pump(&channel, &exchange, cancel), async move {
            tokio::task::yield_now().await;
            stopper.cancel();
        });
        result.unwrap();
    }
}
