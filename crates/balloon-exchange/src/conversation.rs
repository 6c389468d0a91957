// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user pending question routing the next freeform message.

use std::sync::Arc;

use balloon_core::types::Question;
use balloon_core::{BalloonError, StorageAdapter, UserId};
use tracing::debug;

pub struct Conversation {
    store: Arc<dyn StorageAdapter + Send + Sync>,
}

impl Conversation {
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { store }
    }

    /// Arm `question` for the user's next message, replacing any pending one.
    pub async fn ask(&self, user: &UserId, question: Question) -> Result<(), BalloonError> {
        debug!(user = %user, ?question, "question set");
        self.store.set_question(user, Some(&question)).await
    }

    /// Read and clear the pending question in one store round trip.
    pub async fn take(&self, user: &UserId) -> Result<Option<Question>, BalloonError> {
        let question = self.store.take_question(user).await?;
        debug!(user = %user, ?question, "question taken");
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balloon_core::ThreadId;
    use balloon_core::types::User;
    use balloon_test_utils::MemoryStore;
    use chrono::Utc;

    async fn setup() -> (Conversation, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("test", 1);
        store
            .ensure_user(&User::new(user.clone(), Utc::now(), 5))
            .await
            .unwrap();
        (Conversation::new(store), user)
    }

    #[tokio::test]
    async fn question_is_consumed_by_take() {
        let (conversation, user) = setup().await;
        let question = Question::Reply {
            thread: ThreadId("t1".into()),
        };
        conversation.ask(&user, question.clone()).await.unwrap();

        assert_eq!(conversation.take(&user).await.unwrap(), Some(question));
        assert_eq!(conversation.take(&user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn later_question_replaces_earlier() {
        let (conversation, user) = setup().await;
        conversation
            .ask(
                &user,
                Question::Reply {
                    thread: ThreadId("t1".into()),
                },
            )
            .await
            .unwrap();
        conversation.ask(&user, Question::NewMessage).await.unwrap();

        assert_eq!(
            conversation.take(&user).await.unwrap(),
            Some(Question::NewMessage)
        );
    }
}
