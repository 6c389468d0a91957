// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios for the complete exchange.
//!
//! Each test creates an isolated TestHarness. Tests are independent and
//! order-insensitive.

use std::sync::Arc;

use balloon_config::BalloonConfig;
use balloon_core::types::Question;
use balloon_core::{StorageAdapter, ThreadId};
use balloon_exchange::messages;
use balloon_test_utils::{MockChannel, ReadKey, TestHarness};

fn thread_of(out: &balloon_core::types::OutgoingMessage) -> ThreadId {
    out.thread.clone().expect("delivery carries a thread")
}

// ---- Pairing ----

#[tokio::test]
async fn french_channel_pairs_consecutive_senders() {
    let h = TestHarness::new().await.unwrap();

    let out = h.send("alice", "Bonjour tout le monde #fr").await.unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].text.starts_with(messages::NO_MESSAGE_EVER));
    assert!(out[0].text.ends_with("(You have 4 🎈 left!)"));

    let out = h.send("bob", "Salut ! #FR").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].recipient, TestHarness::user("bob"));
    assert!(out[0].text.starts_with(&messages::message_intro("alice")));
    assert!(out[0].text.contains("Bonjour tout le monde #fr"));
    let labels: Vec<&str> = out[0].buttons.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![messages::BUTTON_REPLY, messages::BUTTON_SEND_BACK, messages::BUTTON_HELP]
    );

    let memory = h.memory.as_ref().unwrap();
    let delivered: Vec<_> = memory
        .messages()
        .into_iter()
        .filter(|m| m.delivered_to.is_some())
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].sender, TestHarness::user("alice"));
    assert_eq!(delivered[0].delivered_to, Some(TestHarness::user("bob")));
}

#[tokio::test]
async fn channels_do_not_mix() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "hello #en").await.unwrap();
    let out = h.send("bob", "bonjour #fr").await.unwrap();
    assert!(out[0].text.starts_with(messages::NO_MESSAGE_EVER));

    // Same tag set in another order and case is the same channel.
    h.send("carol", "#Paris #fr un").await.unwrap();
    let out = h.send("dave", "deux #fr #paris").await.unwrap();
    assert!(out[0].text.contains("#Paris #fr un"));
}

#[tokio::test]
async fn sending_twice_in_a_row_finds_yourself() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "first #solo").await.unwrap();
    let out = h.send("alice", "second #solo").await.unwrap();
    assert!(out[0].text.starts_with(messages::YOU_AGAIN));
    assert!(out[0].buttons.is_empty());
}

#[tokio::test]
async fn each_message_is_delivered_once() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "alpha").await.unwrap();
    h.send("bob", "bravo").await.unwrap();
    let out = h.send("carol", "charlie").await.unwrap();
    assert!(out[0].text.contains("bravo"));
    assert!(!out[0].text.contains("alpha"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_never_share_a_delivery() {
    let h = Arc::new(TestHarness::new().await.unwrap());
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.send(&format!("user{i}"), "crowd #party").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let memory = h.memory.as_ref().unwrap();
    let mut messages = memory.messages();
    messages.sort_by_key(|m| m.sequence);
    let sequences: Vec<u64> = messages.iter().filter_map(|m| m.sequence).collect();
    assert_eq!(sequences, (1..=20).collect::<Vec<_>>());

    // Everything but the newest message went to exactly one, distinct, recipient.
    let recipients: std::collections::HashSet<_> = messages[..19]
        .iter()
        .map(|m| m.delivered_to.clone().expect("delivered"))
        .collect();
    assert_eq!(recipients.len(), 19);
    assert!(messages[19].delivered_to.is_none());
}

#[tokio::test(start_paused = true)]
async fn lagging_reads_still_pair() {
    let h = TestHarness::new().await.unwrap();
    let memory = h.memory.clone().unwrap();
    h.send("alice", "hello #lag").await.unwrap();

    memory.set_stale_eventual_reads(true);
    memory.hide_for_reads(ReadKey::Message(balloon_core::Channel("lag".into()), 1), 3);

    let out = h.send("bob", "hi #lag").await.unwrap();
    assert!(out[0].text.contains("hello #lag"));
    assert!(memory.strong_reads() >= 3);
}

// ---- Quota ----

#[tokio::test]
async fn sixth_immediate_send_is_refused() {
    let h = TestHarness::new().await.unwrap();
    for i in 0..5 {
        let out = h.send("alice", &format!("message {i}")).await.unwrap();
        assert_ne!(out[0].text, messages::NO_MORE);
    }
    let out = h.send("alice", "message 5").await.unwrap();
    assert_eq!(out[0].text, messages::NO_MORE);
    assert_eq!(h.credits("alice").await.unwrap(), Some(0));

    h.clock.advance(chrono::Duration::minutes(30));
    let out = h.send("alice", "still too early").await.unwrap();
    assert_eq!(out[0].text, messages::NO_MORE);

    // Refused attempts do not reset the refill clock.
    h.clock.advance(chrono::Duration::minutes(30));
    let out = h.send("alice", "an hour later").await.unwrap();
    assert_ne!(out[0].text, messages::NO_MORE);
}

#[tokio::test]
async fn minimum_length_rearms_the_question() {
    let mut config = BalloonConfig::default();
    config.exchange.min_message_length = 12;
    let h = TestHarness::builder().with_config(config).build().await.unwrap();

    let out = h.send("alice", "short").await.unwrap();
    assert_eq!(out[0].text, messages::too_short(12));
    assert_eq!(h.credits("alice").await.unwrap(), Some(5));

    let user = h.store.get_user(&TestHarness::user("alice")).await.unwrap().unwrap();
    assert_eq!(user.pending_question, Some(Question::NewMessage));

    let out = h.send("alice", "long enough now").await.unwrap();
    assert!(out[0].text.starts_with(messages::NO_MESSAGE_EVER));
}

// ---- Replies ----

#[tokio::test]
async fn reply_button_then_message_reaches_the_author() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "anyone out there? #space").await.unwrap();
    let delivery = h.send("bob", "me! #space").await.unwrap().remove(0);

    let out = h.press("bob", &delivery.buttons[0].command).await.unwrap();
    assert_eq!(out[0].text, messages::TYPE_REPLY);

    let out = h.send("bob", "Yes, hello from Mars").await.unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].recipient, TestHarness::user("alice"));
    assert_eq!(
        out[0].text,
        format!("{}\n\nYes, hello from Mars", messages::reply_intro("bob"))
    );
    assert_eq!(out[1].recipient, TestHarness::user("bob"));
    assert_eq!(out[1].text, messages::REPLY_SENT);

    // The reply was not charged.
    assert_eq!(h.credits("bob").await.unwrap(), Some(4));

    // The thread can not be used a second time.
    let out = h.press("bob", &delivery.buttons[0].command).await.unwrap();
    assert_eq!(out[0].text, messages::REPLY_ALREADY);
    let out = h
        .reply_natively("bob", &thread_of(&delivery), "again?")
        .await
        .unwrap();
    assert_eq!(out[0].text, messages::REPLY_ALREADY);
}

#[tokio::test]
async fn replies_chain_back_and_forth() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "ping #chat").await.unwrap();
    let delivery = h.send("bob", "pong #chat").await.unwrap().remove(0);

    let out = h
        .reply_natively("bob", &thread_of(&delivery), "hi alice")
        .await
        .unwrap();
    let back = thread_of(&out[0]);

    let out = h.reply_natively("alice", &back, "hi bob").await.unwrap();
    assert_eq!(out[0].recipient, TestHarness::user("bob"));
    assert!(out[0].text.ends_with("hi bob"));

    let memory = h.memory.as_ref().unwrap();
    let replies: Vec<_> = memory
        .messages()
        .into_iter()
        .filter(|m| m.reply_to.is_some())
        .collect();
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|m| m.sequence.is_none()));
}

#[tokio::test]
async fn native_reply_clears_a_pending_reply_question() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "from alice #a").await.unwrap();
    let t1 = thread_of(&h.send("bob", "to alice #a").await.unwrap()[0]);
    h.send("carol", "from carol #c").await.unwrap();
    let t2 = thread_of(&h.send("bob", "to carol #c").await.unwrap()[0]);

    h.press("bob", &format!("reply/{t1}")).await.unwrap();
    let out = h.reply_natively("bob", &t2, "hello carol").await.unwrap();
    let recipients: Vec<_> = out.iter().map(|m| m.recipient.clone()).collect();
    assert_eq!(
        recipients,
        vec![TestHarness::user("carol"), TestHarness::user("bob")]
    );
    let bob = h
        .store
        .get_user(&TestHarness::user("bob"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob.pending_question, None);

    let out = h.send("bob", "a brand new message #it").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].recipient, TestHarness::user("bob"));
    assert!(out[0].text.starts_with(messages::NO_MESSAGE_EVER));

    // alice's thread is still open for an explicit reply.
    let t1_state = h.store.get_thread(&t1).await.unwrap().unwrap();
    assert!(!t1_state.claimed);
}

#[tokio::test]
async fn only_the_recipient_can_reply() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "secret #x").await.unwrap();
    let delivery = h.send("bob", "open #x").await.unwrap().remove(0);

    let out = h
        .reply_natively("mallory", &thread_of(&delivery), "I'm bob")
        .await
        .unwrap();
    assert_eq!(out[0].text, messages::NOT_FOUND);
    let out = h.press("mallory", &delivery.buttons[0].command).await.unwrap();
    assert_eq!(out[0].text, messages::NOT_FOUND);
}

#[tokio::test]
async fn late_reply_is_rejected_and_consumes_the_thread() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "hello #late").await.unwrap();
    let delivery = h.send("bob", "hi #late").await.unwrap().remove(0);
    let thread = thread_of(&delivery);

    h.clock
        .advance(chrono::Duration::hours(24) + chrono::Duration::minutes(2));
    let out = h.reply_natively("bob", &thread, "sorry, late").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text, messages::REPLY_EXPIRED);

    let stored = h.store.get_thread(&thread).await.unwrap().unwrap();
    assert!(stored.claimed);
    assert!(stored.reply_message_id.is_none());
}

// ---- Send back ----

#[tokio::test]
async fn sending_back_returns_one_credit_once() {
    let h = TestHarness::new().await.unwrap();
    h.send("alice", "a gift #kind").await.unwrap();
    let delivery = h.send("bob", "thanks #kind").await.unwrap().remove(0);
    assert_eq!(h.credits("alice").await.unwrap(), Some(4));

    let send_back = &delivery.buttons[1].command;
    let out = h.press("bob", send_back).await.unwrap();
    assert_eq!(out[0].text, messages::SENT_BACK);
    assert_eq!(h.credits("alice").await.unwrap(), Some(5));

    let out = h.press("bob", send_back).await.unwrap();
    assert_eq!(out[0].text, messages::SENT_BACK_ALREADY);
    let out = h.press("carol", send_back).await.unwrap();
    assert_eq!(out[0].text, messages::NOT_FOUND);
    assert_eq!(h.credits("alice").await.unwrap(), Some(5));
}

// ---- Commands ----

#[tokio::test]
async fn trending_ranks_recent_channels() {
    let h = TestHarness::new().await.unwrap();
    h.send("a", "one #en").await.unwrap();
    h.send("b", "two #en").await.unwrap();
    h.send("c", "three #fr #paris").await.unwrap();
    h.send("d", "no tags at all").await.unwrap();

    let out = h.command("e", "/trending").await.unwrap();
    assert_eq!(
        out[0].text,
        format!("{}\n1 - #en\n2 - #fr #paris", messages::TRENDING_HEADER)
    );
    assert_eq!(out[0].buttons[0].command, "letsgo");

    h.clock.advance(chrono::Duration::days(8));
    let out = h.command("e", "/trending").await.unwrap();
    assert_eq!(out[0].text, messages::TRENDING_EMPTY);
}

#[tokio::test]
async fn letsgo_sets_the_new_message_question() {
    let h = TestHarness::new().await.unwrap();
    let out = h.press("alice", "letsgo").await.unwrap();
    assert_eq!(out[0].text, messages::NEW_FIRST);

    h.send("alice", "there").await.unwrap();
    let out = h.command("alice", "/new").await.unwrap();
    assert_eq!(out[0].text, messages::NEW_AGAIN);
}

#[tokio::test(start_paused = true)]
async fn unknown_alias_is_an_unknown_command() {
    let h = TestHarness::new().await.unwrap();
    let out = h.press("alice", ":0123456789abcdef").await.unwrap();
    assert_eq!(out[0].text, messages::unknown_command(":0123456789abcdef"));
}

// ---- Pump and SQLite ----

#[tokio::test]
async fn pump_delivers_through_a_channel() {
    let h = TestHarness::new().await.unwrap();
    let channel = MockChannel::new();
    channel
        .inject(balloon_core::types::IncomingEvent::Command(
            balloon_core::types::IncomingCommand {
                user: TestHarness::user("alice"),
                text: "/help".into(),
            },
        ))
        .await;
    channel.close().await;

    balloon_exchange::pump(&channel, &h.exchange, tokio_util::sync::CancellationToken::new())
        .await
        .unwrap();
    let sent = channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, messages::HELP);
}

#[tokio::test]
async fn sqlite_backend_runs_the_full_flow() {
    let h = TestHarness::builder().with_sqlite().build().await.unwrap();
    h.send("alice", "persist me #db").await.unwrap();
    let delivery = h.send("bob", "done #db").await.unwrap().remove(0);
    assert!(delivery.text.contains("persist me #db"));

    let out = h
        .reply_natively("bob", &thread_of(&delivery), "stored reply")
        .await
        .unwrap();
    assert_eq!(out[0].recipient, TestHarness::user("alice"));

    let out = h.press("bob", &delivery.buttons[1].command).await.unwrap();
    assert_eq!(out[0].text, messages::SENT_BACK);
    assert_eq!(h.credits("alice").await.unwrap(), Some(5));

    let out = h.command("carol", "trending").await.unwrap();
    assert!(out[0].text.ends_with("1 - #db"));
}
