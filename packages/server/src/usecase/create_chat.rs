//! UseCase: チャット作成処理

use std::sync::Arc;

use engawa_shared::time::Clock;

use crate::domain::{Chat, ChatId, ChatRepository, Timestamp};

use super::error::ServiceError;

/// チャット作成のユースケース
///
/// ID はストアが採番します。保存に失敗した場合、呼び出し側はルームを開きません。
pub struct CreateChatUseCase {
    repository: Arc<dyn ChatRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateChatUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<ChatId, ServiceError> {
        let chat = Chat::new(Timestamp::new(self.clock.now_millis()));
        let id = self.repository.save(chat).await?;
        tracing::info!(chat_id = %id, "chat created");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockChatRepository, RepositoryError};
    use engawa_shared::time::FixedClock;

    #[tokio::test]
    async fn test_create_chat_saves_empty_chat_with_current_time() {
        // テスト項目: 作成時刻付き・メンバーなしの Chat が保存され、採番された ID が返る
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_save()
            .withf(|chat| {
                chat.id.is_none()
                    && chat.user_ids.is_empty()
                    && chat.created_at == Timestamp::new(1_700_000_000_000)
            })
            .times(1)
            .returning(|_| Ok(ChatId::new(1)));
        let usecase = CreateChatUseCase::new(
            Arc::new(repository),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        );

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(result, Ok(ChatId::new(1)));
    }

    #[tokio::test]
    async fn test_create_chat_propagates_store_failure() {
        // テスト項目: 保存失敗はエラーとして返る
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_save()
            .returning(|_| Err(RepositoryError::Transaction("deadlock".to_string())));
        let usecase = CreateChatUseCase::new(Arc::new(repository), Arc::new(FixedClock::new(0)));

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }
}
