// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite rows and the shared domain types.
//!
//! Columns are read by name, so every query using these mappers must select
//! the columns listed in the matching `*_COLUMNS` constant.

use balloon_core::types::{
    Channel, ChannelActivity, Message, MessageId, Question, ReplyThread, ThreadId, User, UserId,
};
use rusqlite::Row;
use rusqlite::types::Type;

pub(crate) const USER_COLUMNS: &str =
    "id, created_at, credits, credits_updated_at, pending_question, first_send";

pub(crate) const MESSAGE_COLUMNS: &str = "id, channel, sequence, sender, display_name, body, \
     created_at, delivered_to, delivered_at, reply_to, credit_returned";

pub(crate) const THREAD_COLUMNS: &str =
    "id, claimed, sender, recipient, message_id, reply_message_id, created_at, claimed_at";

pub(crate) const CHANNEL_COLUMNS: &str = "channel, seq, last_message_day, last_message_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let question: Option<String> = row.get("pending_question")?;
    Ok(User {
        id: UserId(row.get("id")?),
        created_at: row.get("created_at")?,
        credits: row.get("credits")?,
        credits_updated_at: row.get("credits_updated_at")?,
        pending_question: question.as_deref().map(parse_question).transpose()?,
        first_send: row.get("first_send")?,
    })
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: MessageId(row.get("id")?),
        channel: Channel(row.get("channel")?),
        sequence: row.get("sequence")?,
        sender: UserId(row.get("sender")?),
        display_name: row.get("display_name")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        delivered_to: row.get::<_, Option<String>>("delivered_to")?.map(UserId),
        delivered_at: row.get("delivered_at")?,
        reply_to: row.get::<_, Option<String>>("reply_to")?.map(MessageId),
        credit_returned: row.get("credit_returned")?,
    })
}

pub(crate) fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyThread> {
    Ok(ReplyThread {
        id: ThreadId(row.get("id")?),
        claimed: row.get("claimed")?,
        sender: UserId(row.get("sender")?),
        recipient: UserId(row.get("recipient")?),
        message_id: MessageId(row.get("message_id")?),
        reply_message_id: row
            .get::<_, Option<String>>("reply_message_id")?
            .map(MessageId),
        created_at: row.get("created_at")?,
        claimed_at: row.get("claimed_at")?,
    })
}

pub(crate) fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ChannelActivity> {
    Ok(ChannelActivity {
        channel: Channel(row.get("channel")?),
        sequence: row.get("seq")?,
        last_message_day: row.get("last_message_day")?,
        last_message_at: row.get("last_message_at")?,
    })
}

/// Decode the JSON-encoded pending question column.
pub(crate) fn parse_question(raw: &str) -> rusqlite::Result<Question> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_column_decodes_reply() {
        let q = parse_question(r#"{"name":"reply","params":{"thread":"abc"}}"#).unwrap();
        assert_eq!(
            q,
            Question::Reply {
                thread: ThreadId("abc".into())
            }
        );
    }

    #[test]
    fn question_column_rejects_garbage() {
        assert!(parse_question("not json").is_err());
    }
}
