// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event dispatch: the entry point of the exchange.
//!
//! [`Exchange::handle`] turns one inbound event into the messages to send.
//! It keeps no state between events; everything shared lives in the store
//! and is coordinated there with guarded updates.

use std::sync::Arc;
use std::time::Duration;

use balloon_config::BalloonConfig;
use balloon_core::types::{
    Button, ChannelActivity, Conditional, IncomingEvent, IncomingMessage, Message, OutgoingMessage,
    Question, User,
};
use balloon_core::{
    BalloonError, Channel, Clock, MessageId, PluginAdapter, StorageAdapter, ThreadId, UserId,
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::alias::{ALIAS_PREFIX, AliasStore};
use crate::backoff::PollPolicy;
use crate::channel::derive_channel;
use crate::commands::Command;
use crate::context::RequestContext;
use crate::conversation::Conversation;
use crate::messages;
use crate::pairing::{Draft, PairingStore};
use crate::quota::{DebitOutcome, QuotaManager};
use crate::threads::{ReplyClaim, ReplyThreads};
use crate::trending::{self, Trending};

pub struct Exchange {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    clock: Arc<dyn Clock>,
    default_channel: String,
    min_message_length: usize,
    event_timeout: Duration,
    initial_credits: u32,
    command_limit: usize,
    quota: QuotaManager,
    pairing: PairingStore,
    threads: ReplyThreads,
    conversation: Conversation,
    trending: Trending,
    aliases: AliasStore,
}

impl Exchange {
    pub fn new(
        store: Arc<dyn StorageAdapter + Send + Sync>,
        clock: Arc<dyn Clock>,
        config: &BalloonConfig,
    ) -> Self {
        let poll = PollPolicy::from_config(&config.pairing);
        let default_channel = config.exchange.default_channel.clone();
        Self {
            quota: QuotaManager::new(store.clone(), config.quota.replenish_base()),
            pairing: PairingStore::new(store.clone(), poll),
            threads: ReplyThreads::new(store.clone(), config.threads.reply_deadline()),
            conversation: Conversation::new(store.clone()),
            trending: Trending::new(
                store.clone(),
                Channel(default_channel.clone()),
                &config.trending,
            ),
            aliases: AliasStore::new(store.clone(), poll),
            store,
            clock,
            default_channel,
            min_message_length: config.exchange.min_message_length,
            event_timeout: config.exchange.event_timeout(),
            initial_credits: config.quota.initial_credits,
            command_limit: config.aliases.command_limit,
        }
    }

    /// Handle one inbound event and return the messages to deliver.
    ///
    /// Guard failures become user-facing replies. Store failures, and
    /// events that run past the configured timeout, are returned as errors;
    /// the event may then be retried by the platform.
    pub async fn handle(&self, event: IncomingEvent) -> Result<Vec<OutgoingMessage>, BalloonError> {
        let span = info_span!("event", user = %event.user());
        let timeout = self.event_timeout;
        match tokio::time::timeout(timeout, self.dispatch(event).instrument(span)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "event handling timed out");
                Err(BalloonError::Timeout { duration: timeout })
            }
        }
    }

    /// Return `command` unchanged if it is shorter than `limit` bytes,
    /// otherwise store it and return its `:`-prefixed alias.
    ///
    /// An alias is never aliased again. A platform whose limit cannot fit an
    /// alias gets it unchanged, with a warning.
    pub async fn compact_command(&self, command: &str, limit: usize) -> Result<String, BalloonError> {
        if command.len() < limit {
            return Ok(command.to_string());
        }
        if command.starts_with(ALIAS_PREFIX) {
            warn!(command, limit, "aliased command does not fit the platform limit");
            return Ok(command.to_string());
        }
        let id = self.aliases.create(command).await?;
        Ok(format!("{ALIAS_PREFIX}{id}"))
    }

    /// Compact every button command of `message` for a platform accepting
    /// commands shorter than `limit` bytes.
    pub async fn compact_buttons(
        &self,
        mut message: OutgoingMessage,
        limit: usize,
    ) -> Result<OutgoingMessage, BalloonError> {
        for button in &mut message.buttons {
            button.command = self.compact_command(&button.command, limit).await?;
        }
        Ok(message)
    }

    /// The current trending channels.
    pub async fn trending(&self) -> Result<Vec<ChannelActivity>, BalloonError> {
        self.trending.top(self.clock.now().date_naive()).await
    }

    /// The stored credit balance of `user`, if the user exists.
    pub async fn credits(&self, user: &UserId) -> Result<Option<u32>, BalloonError> {
        Ok(self.store.get_user(user).await?.map(|u| u.credits))
    }

    async fn dispatch(&self, event: IncomingEvent) -> Result<Vec<OutgoingMessage>, BalloonError> {
        let now = self.clock.now();
        let user = event.user().clone();
        let record = self
            .store
            .ensure_user(&User::new(user.clone(), now, self.initial_credits))
            .await?;

        match event {
            IncomingEvent::Command(command) => {
                let ctx = RequestContext::new(user, "", now, record.credits);
                self.on_command(&ctx, &command.text, record.first_send).await
            }
            IncomingEvent::ButtonCallback(callback) => {
                debug!(original = ?callback.original_message, "button pressed");
                let ctx = RequestContext::new(user, "", now, record.credits);
                self.on_command(&ctx, &callback.payload, record.first_send)
                    .await
            }
            IncomingEvent::Message(message) => {
                let ctx =
                    RequestContext::new(user, message.display_name.clone(), now, record.credits);
                self.on_message(&ctx, message).await
            }
        }
    }

    // --- Commands ---

    async fn on_command(
        &self,
        ctx: &RequestContext,
        text: &str,
        first_send: bool,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        let command = match Command::parse(text) {
            Command::Alias(id) => match self.aliases.resolve(&id).await? {
                Some(long) => match Command::parse(&long) {
                    // Aliases never point at other aliases.
                    Command::Alias(_) => Command::Unknown(text.to_string()),
                    resolved => resolved,
                },
                None => Command::Unknown(text.to_string()),
            },
            parsed => parsed,
        };
        debug!(%command, "command received");

        let reply = match command {
            Command::Start => OutgoingMessage::new(ctx.user.clone(), messages::WELCOME)
                .markdown()
                .with_buttons(
                    self.buttons(vec![
                        (messages::BUTTON_FIRST, Command::NewMessage),
                        (messages::BUTTON_TRENDING, Command::Trending),
                    ])
                    .await?,
                ),
            Command::Help => OutgoingMessage::new(ctx.user.clone(), messages::HELP)
                .markdown()
                .with_buttons(
                    self.buttons(vec![(messages::BUTTON_NEW, Command::NewMessage)])
                        .await?,
                ),
            Command::NewMessage => {
                self.conversation
                    .ask(&ctx.user, Question::NewMessage)
                    .await?;
                let text = if first_send {
                    messages::NEW_FIRST
                } else {
                    messages::NEW_AGAIN
                };
                OutgoingMessage::new(ctx.user.clone(), text)
            }
            Command::Status => {
                OutgoingMessage::new(ctx.user.clone(), messages::status(ctx.credits))
            }
            Command::Trending => self.on_trending(ctx).await?,
            Command::Reply(thread) => self.on_reply_command(ctx, thread).await?,
            Command::SendBack(message) => self.on_send_back(ctx, &message).await?,
            Command::Alias(_) | Command::Unknown(_) => {
                OutgoingMessage::new(ctx.user.clone(), messages::unknown_command(text)).markdown()
            }
        };
        Ok(vec![reply])
    }

    async fn on_trending(&self, ctx: &RequestContext) -> Result<OutgoingMessage, BalloonError> {
        let top = self.trending.top(ctx.now.date_naive()).await?;
        let text = if top.is_empty() {
            messages::TRENDING_EMPTY.to_string()
        } else {
            format!(
                "{}\n{}",
                messages::TRENDING_HEADER,
                trending::render(&top).join("\n")
            )
        };
        Ok(OutgoingMessage::new(ctx.user.clone(), text).with_buttons(
            self.buttons(vec![(messages::BUTTON_NEW, Command::NewMessage)])
                .await?,
        ))
    }

    async fn on_reply_command(
        &self,
        ctx: &RequestContext,
        thread: ThreadId,
    ) -> Result<OutgoingMessage, BalloonError> {
        let text = match self.threads.get_for(&thread, &ctx.user).await? {
            None => messages::NOT_FOUND,
            Some(open) if open.claimed => messages::REPLY_ALREADY,
            Some(_) => {
                self.conversation
                    .ask(&ctx.user, Question::Reply { thread })
                    .await?;
                messages::TYPE_REPLY
            }
        };
        Ok(OutgoingMessage::new(ctx.user.clone(), text))
    }

    async fn on_send_back(
        &self,
        ctx: &RequestContext,
        message: &MessageId,
    ) -> Result<OutgoingMessage, BalloonError> {
        let text = match self.store.mark_credit_returned(message, &ctx.user).await? {
            Conditional::Applied(returned) => {
                self.store.grant_credit(&returned.sender).await?;
                info!(message = %message, author = %returned.sender, "balloon sent back");
                messages::SENT_BACK
            }
            Conditional::GuardFailed => {
                let delivered_here = self
                    .store
                    .get_message(message)
                    .await?
                    .is_some_and(|m| m.delivered_to.as_ref() == Some(&ctx.user));
                if delivered_here {
                    messages::SENT_BACK_ALREADY
                } else {
                    messages::NOT_FOUND
                }
            }
        };
        Ok(OutgoingMessage::new(ctx.user.clone(), text))
    }

    // --- Freeform messages ---

    async fn on_message(
        &self,
        ctx: &RequestContext,
        message: IncomingMessage,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        // Every freeform message consumes the pending question, even when a
        // native reply overrides where it goes.
        let pending = self.conversation.take(&ctx.user).await?;
        if let Some(thread) = &message.reply_to {
            return self.on_reply(ctx, thread, &message.text).await;
        }
        match pending {
            Some(Question::Reply { thread }) => self.on_reply(ctx, &thread, &message.text).await,
            Some(Question::NewMessage) | None => self.on_new_message(ctx, &message.text).await,
        }
    }

    async fn on_new_message(
        &self,
        ctx: &RequestContext,
        text: &str,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        let min = self.min_message_length;
        if min > 0 && text.chars().count() < min {
            self.conversation
                .ask(&ctx.user, Question::NewMessage)
                .await?;
            return Ok(vec![OutgoingMessage::new(
                ctx.user.clone(),
                messages::too_short(min),
            )]);
        }

        let ctx = match self.quota.try_debit(&ctx.user, ctx.now).await? {
            DebitOutcome::Authorized { remaining } => ctx.with_credits(remaining),
            DebitOutcome::Exhausted => {
                return Ok(vec![OutgoingMessage::new(ctx.user.clone(), messages::NO_MORE)]);
            }
        };

        let channel = derive_channel(text, &self.default_channel);
        let accepted = self
            .pairing
            .accept(
                Draft {
                    channel: channel.clone(),
                    sender: ctx.user.clone(),
                    display_name: ctx.display_name.clone(),
                    body: text.to_string(),
                },
                ctx.now,
            )
            .await?;
        let first_send = self.store.clear_first_send(&ctx.user).await?.is_applied();
        let with_hint = |text: String| {
            if first_send {
                format!("{text}\n\n{}", messages::FIRST_SEND_HINT)
            } else {
                text
            }
        };
        let nothing_yet = |text: &str| {
            vec![OutgoingMessage::new(
                ctx.user.clone(),
                ctx.with_status(&with_hint(text.to_string())),
            )]
        };

        let Some(predecessor) = self
            .pairing
            .fetch_predecessor(&channel, accepted.sequence)
            .await?
        else {
            return Ok(nothing_yet(messages::NO_MESSAGE_EVER));
        };
        if predecessor.sender == ctx.user {
            return Ok(nothing_yet(messages::YOU_AGAIN));
        }
        if !self
            .pairing
            .claim_for_delivery(&predecessor, &ctx.user, ctx.now)
            .await?
        {
            return Ok(nothing_yet(messages::NO_MESSAGE_EVER));
        }

        let thread = self.threads.open(&predecessor, &ctx.user, ctx.now).await?;
        let body = with_hint(format!(
            "{}\n\n{}",
            messages::message_intro(&predecessor.display_name),
            predecessor.body
        ));
        let buttons = self
            .buttons(vec![
                (messages::BUTTON_REPLY, Command::Reply(thread.id.clone())),
                (
                    messages::BUTTON_SEND_BACK,
                    Command::SendBack(predecessor.id.clone()),
                ),
                (messages::BUTTON_HELP, Command::Help),
            ])
            .await?;
        Ok(vec![
            OutgoingMessage::new(ctx.user.clone(), ctx.with_status(&body))
                .with_buttons(buttons)
                .with_thread(thread.id),
        ])
    }

    async fn on_reply(
        &self,
        ctx: &RequestContext,
        thread: &ThreadId,
        text: &str,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        let claimed = match self.threads.claim(thread, &ctx.user, ctx.now).await? {
            ReplyClaim::Accepted(claimed) => claimed,
            ReplyClaim::AlreadyClaimed => return Ok(self.notice(ctx, messages::REPLY_ALREADY)),
            ReplyClaim::Expired => return Ok(self.notice(ctx, messages::REPLY_EXPIRED)),
            ReplyClaim::NotFound => return Ok(self.notice(ctx, messages::NOT_FOUND)),
        };

        let original = self
            .store
            .get_message(&claimed.message_id)
            .await?
            .ok_or_else(|| {
                BalloonError::Internal(format!(
                    "thread {} points at missing message {}",
                    claimed.id, claimed.message_id
                ))
            })?;

        let reply = Message {
            id: MessageId::generate(),
            channel: original.channel.clone(),
            sequence: None,
            sender: ctx.user.clone(),
            display_name: ctx.display_name.clone(),
            body: text.to_string(),
            created_at: ctx.now,
            delivered_to: Some(claimed.sender.clone()),
            delivered_at: Some(ctx.now),
            reply_to: Some(original.id.clone()),
            credit_returned: false,
        };
        self.store.insert_message(&reply).await?;
        self.threads.record_reply(&claimed.id, &reply.id).await?;
        let back = self.threads.open(&reply, &claimed.sender, ctx.now).await?;
        info!(thread = %claimed.id, to = %claimed.sender, "reply delivered");

        let buttons = self
            .buttons(vec![
                (messages::BUTTON_REPLY, Command::Reply(back.id.clone())),
                (messages::BUTTON_HELP, Command::Help),
            ])
            .await?;
        Ok(vec![
            OutgoingMessage::new(
                claimed.sender.clone(),
                format!("{}\n\n{text}", messages::reply_intro(&ctx.display_name)),
            )
            .with_buttons(buttons)
            .with_thread(back.id),
            OutgoingMessage::new(ctx.user.clone(), messages::REPLY_SENT),
        ])
    }

    fn notice(&self, ctx: &RequestContext, text: &str) -> Vec<OutgoingMessage> {
        vec![OutgoingMessage::new(ctx.user.clone(), text)]
    }

    async fn buttons(&self, specs: Vec<(&str, Command)>) -> Result<Vec<Button>, BalloonError> {
        let mut buttons = Vec::with_capacity(specs.len());
        for (label, command) in specs {
            let command = self
                .compact_command(&command.to_string(), self.command_limit)
                .await?;
            buttons.push(Button::new(label, command));
        }
        Ok(buttons)
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("store", &self.store.name())
            .field("default_channel", &self.default_channel)
            .finish_non_exhaustive()
    }
}
