//! UseCase: チャット削除処理
//!
//! 処理順序:
//!
//! 1. 稼働中のルームを退去させる（参加者のストリームはここで切断される）
//! 2. 認可サービスに削除権限を問い合わせる
//! 3. 権限があればストアから Chat を削除する
//!
//! 権限がない場合でも 1 は実行済みです。ルームは閉じられ、Chat は残ります。

use std::sync::Arc;

use crate::domain::{AuthService, ChatId, ChatRepository, RoomDirectory, UserId};

use super::error::ServiceError;

/// チャット削除のユースケース
pub struct DeleteChatUseCase {
    rooms: Arc<dyn RoomDirectory>,
    repository: Arc<dyn ChatRepository>,
    auth: Arc<dyn AuthService>,
}

impl DeleteChatUseCase {
    pub fn new(
        rooms: Arc<dyn RoomDirectory>,
        repository: Arc<dyn ChatRepository>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        Self {
            rooms,
            repository,
            auth,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, chat_id: ChatId, caller: UserId) -> Result<(), ServiceError> {
        let evicted = self.rooms.evict(chat_id).await;
        tracing::debug!(evicted, "live room evicted");

        if !self.auth.can_delete(caller).await? {
            tracing::warn!("delete denied by authorization service");
            return Err(ServiceError::PermissionDenied(caller));
        }

        self.repository.delete(chat_id).await?;
        tracing::info!("chat deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AuthServiceError, MockAuthService, MockChatRepository, MockRoomDirectory,
    };
    use mockall::Sequence;

    #[tokio::test]
    async fn test_delete_evicts_then_checks_rights_then_deletes() {
        // テスト項目: ルーム退去 → 権限確認 → 削除 の順で実行される
        // given (前提条件):
        let mut seq = Sequence::new();
        let mut rooms = MockRoomDirectory::new();
        let mut auth = MockAuthService::new();
        let mut repository = MockChatRepository::new();
        rooms
            .expect_evict()
            .withf(|id| *id == ChatId::new(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);
        auth.expect_can_delete()
            .withf(|user| *user == UserId::new(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        repository
            .expect_delete()
            .withf(|id| *id == ChatId::new(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let usecase =
            DeleteChatUseCase::new(Arc::new(rooms), Arc::new(repository), Arc::new(auth));

        // when (操作):
        let result = usecase.execute(ChatId::new(1), UserId::new(7)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_delete_denied_still_evicts_room_and_keeps_chat() {
        // テスト項目: 権限がない場合、ルームは退去済みのまま PermissionDenied が返り、Chat は削除されない
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        let mut auth = MockAuthService::new();
        let mut repository = MockChatRepository::new();
        rooms.expect_evict().times(1).returning(|_| true);
        auth.expect_can_delete().returning(|_| Ok(false));
        repository.expect_delete().never();
        let usecase =
            DeleteChatUseCase::new(Arc::new(rooms), Arc::new(repository), Arc::new(auth));

        // when (操作):
        let result = usecase.execute(ChatId::new(1), UserId::new(7)).await;

        // then (期待する結果):
        assert_eq!(result, Err(ServiceError::PermissionDenied(UserId::new(7))));
    }

    #[tokio::test]
    async fn test_delete_with_auth_service_failure_is_internal() {
        // テスト項目: 認可サービスの障害は Internal として返り、Chat は削除されない
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        let mut auth = MockAuthService::new();
        let mut repository = MockChatRepository::new();
        rooms.expect_evict().returning(|_| false);
        auth.expect_can_delete()
            .returning(|_| Err(AuthServiceError::Unavailable("connection refused".to_string())));
        repository.expect_delete().never();
        let usecase =
            DeleteChatUseCase::new(Arc::new(rooms), Arc::new(repository), Arc::new(auth));

        // when (操作):
        let result = usecase.execute(ChatId::new(1), UserId::new(7)).await;

        // then (期待する結果):
        let error = result.unwrap_err();
        assert!(matches!(error, ServiceError::AuthService(_)));
        assert_eq!(error.kind(), crate::domain::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_delete_without_live_room_still_deletes_chat() {
        // テスト項目: ルームが稼働していなくても Chat は削除される
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        let mut auth = MockAuthService::new();
        let mut repository = MockChatRepository::new();
        rooms.expect_evict().returning(|_| false);
        auth.expect_can_delete().returning(|_| Ok(true));
        repository.expect_delete().times(1).returning(|_| Ok(()));
        let usecase =
            DeleteChatUseCase::new(Arc::new(rooms), Arc::new(repository), Arc::new(auth));

        // when (操作):
        let result = usecase.execute(ChatId::new(1), UserId::new(7)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }
}
