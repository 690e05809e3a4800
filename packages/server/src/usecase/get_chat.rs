//! UseCase: チャット詳細取得

use std::sync::Arc;

use crate::domain::{Chat, ChatId, ChatRepository};

use super::error::ServiceError;

pub struct GetChatUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl GetChatUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, chat_id: ChatId) -> Result<Chat, ServiceError> {
        Ok(self.repository.get(chat_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockChatRepository, RepositoryError, Timestamp, UserId};

    #[tokio::test]
    async fn test_get_chat_returns_stored_chat() {
        // テスト項目: 保存済みの Chat がそのまま返る
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_get()
            .withf(|id| *id == ChatId::new(1))
            .returning(|id| Ok(Chat::restore(id, vec![UserId::new(7)], Timestamp::new(1000))));
        let usecase = GetChatUseCase::new(Arc::new(repository));

        // when (操作):
        let chat = usecase.execute(ChatId::new(1)).await.unwrap();

        // then (期待する結果):
        assert_eq!(chat.id, Some(ChatId::new(1)));
        assert_eq!(chat.user_ids, vec![UserId::new(7)]);
    }

    #[tokio::test]
    async fn test_get_missing_chat_is_not_found() {
        // テスト項目: 存在しない Chat は ChatNotFound になる
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_get()
            .returning(|id| Err(RepositoryError::ChatNotFound(id)));
        let usecase = GetChatUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase.execute(ChatId::new(9)).await;

        // then (期待する結果):
        assert_eq!(result, Err(ServiceError::ChatNotFound(ChatId::new(9))));
    }
}
