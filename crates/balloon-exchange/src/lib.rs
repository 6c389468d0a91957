// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Balloon exchange engine.
//!
//! Users send short messages. Each message is filed under a channel derived
//! from its hashtags and paired with the previous message of that channel,
//! which is delivered back to the sender. Sending costs a credit; credits
//! refill over time. A delivered message can be answered once.
//!
//! [`Exchange`] is the entry point; [`pump`] connects it to a
//! [`ChannelAdapter`](balloon_core::ChannelAdapter).

pub mod alias;
pub mod backoff;
pub mod channel;
pub mod commands;
pub mod context;
pub mod conversation;
pub mod exchange;
pub mod messages;
pub mod pairing;
pub mod pump;
pub mod quota;
pub mod sequence;
pub mod threads;
pub mod trending;

pub use backoff::PollPolicy;
pub use channel::derive_channel;
pub use commands::Command;
pub use exchange::Exchange;
pub use pump::pump;
pub use quota::{DebitOutcome, accrued_credits};
pub use threads::ReplyClaim;
