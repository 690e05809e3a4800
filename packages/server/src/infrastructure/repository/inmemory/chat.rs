//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! リレーショナルストアと同じ形のテーブル（`chats`, `chat_users`）を
//! メモリ上に持ち、複数行にまたがる変更は `read_committed` で
//! トランザクションとして適用します。
//!
//! ## トランザクション
//!
//! クロージャはテーブルのステージングコピーに対して実行されます。
//!
//! - `Ok` ならコピーをコミット
//! - `Err` ならコピーを破棄（ロールバック）
//! - panic した場合も捕捉してロールバックし、`RepositoryError::Transaction` に変換

use std::{
    any::Any,
    collections::BTreeMap,
    panic::{AssertUnwindSafe, catch_unwind},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Chat, ChatId, ChatRepository, RepositoryError, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChatRow {
    created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChatUserRow {
    chat_id: i64,
    user_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tables {
    chats: BTreeMap<i64, ChatRow>,
    chat_users: Vec<ChatUserRow>,
    last_id: i64,
}

impl Tables {
    fn delete_chat_users(&mut self, chat_id: i64) {
        self.chat_users.retain(|row| row.chat_id != chat_id);
    }

    fn insert_chat_users(&mut self, chat_id: i64, user_ids: &[UserId]) {
        self.chat_users
            .extend(user_ids.iter().map(|user_id| ChatUserRow {
                chat_id,
                user_id: user_id.value(),
            }));
    }
}

/// インメモリ Chat Repository 実装
#[derive(Default)]
pub struct InMemoryChatRepository {
    tables: Mutex<Tables>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as one transaction over the tables.
    async fn read_committed<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Tables) -> Result<T, RepositoryError>,
    {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();

        match catch_unwind(AssertUnwindSafe(|| f(&mut staged))) {
            Ok(Ok(value)) => {
                *tables = staged;
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::debug!("transaction rolled back: {}", e);
                Err(e)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!("transaction panicked, rolled back: {}", reason);
                Err(RepositoryError::Transaction(reason))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn require_id(chat: &Chat) -> Result<ChatId, RepositoryError> {
    chat.id
        .ok_or_else(|| RepositoryError::Storage("chat has not been saved yet".to_string()))
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save(&self, chat: Chat) -> Result<ChatId, RepositoryError> {
        self.read_committed(|tables| {
            tables.last_id += 1;
            let id = tables.last_id;
            tables.chats.insert(
                id,
                ChatRow {
                    created_at: chat.created_at.value(),
                },
            );
            tables.insert_chat_users(id, &chat.user_ids);
            Ok(ChatId::new(id))
        })
        .await
    }

    async fn get(&self, id: ChatId) -> Result<Chat, RepositoryError> {
        let tables = self.tables.lock().await;
        let row = tables
            .chats
            .get(&id.value())
            .ok_or(RepositoryError::ChatNotFound(id))?;
        let user_ids = tables
            .chat_users
            .iter()
            .filter(|user| user.chat_id == id.value())
            .map(|user| UserId::new(user.user_id))
            .collect();

        Ok(Chat::restore(id, user_ids, Timestamp::new(row.created_at)))
    }

    async fn update(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let id = require_id(chat)?;
        self.read_committed(|tables| {
            if !tables.chats.contains_key(&id.value()) {
                return Err(RepositoryError::ChatNotFound(id));
            }
            tables.delete_chat_users(id.value());
            tables.insert_chat_users(id.value(), &chat.user_ids);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: ChatId) -> Result<(), RepositoryError> {
        self.read_committed(|tables| {
            tables.delete_chat_users(id.value());
            tables.chats.remove(&id.value());
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryChatRepository の save/get/update/delete
    // - read_committed のコミット・ロールバック（エラー・panic）
    //
    // 【なぜこのテストが必要か】
    // - UseCase 層は ChatNotFound とその他のエラーを区別して扱う
    // - update/delete は複数テーブルにまたがるため、途中失敗で半端な状態を残してはいけない
    // ========================================

    fn saved_chat(repo_id: ChatId, users: &[i64]) -> Chat {
        Chat::restore(
            repo_id,
            users.iter().copied().map(UserId::new).collect(),
            Timestamp::new(1000),
        )
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        // テスト項目: save でストアが ID を連番で採番する
        // given (前提条件):
        let repo = InMemoryChatRepository::new();

        // when (操作):
        let first = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        let second = repo.save(Chat::new(Timestamp::new(2000))).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, ChatId::new(1));
        assert_eq!(second, ChatId::new(2));
        let stored = repo.get(second).await.unwrap();
        assert_eq!(stored.id, Some(second));
        assert_eq!(stored.created_at, Timestamp::new(2000));
        assert!(stored.user_ids.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_chat_returns_not_found() {
        // テスト項目: 存在しない Chat の取得は ChatNotFound を返す
        // given (前提条件):
        let repo = InMemoryChatRepository::new();

        // when (操作):
        let result = repo.get(ChatId::new(5)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::ChatNotFound(ChatId::new(5))));
    }

    #[tokio::test]
    async fn test_update_replaces_membership() {
        // テスト項目: update でメンバー一覧が丸ごと置き換わる
        // given (前提条件):
        let repo = InMemoryChatRepository::new();
        let id = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        repo.update(&saved_chat(id, &[7, 9])).await.unwrap();

        // when (操作):
        repo.update(&saved_chat(id, &[9, 11])).await.unwrap();

        // then (期待する結果):
        let stored = repo.get(id).await.unwrap();
        assert_eq!(stored.user_ids, vec![UserId::new(9), UserId::new(11)]);
    }

    #[tokio::test]
    async fn test_update_missing_chat_leaves_tables_untouched() {
        // テスト項目: 存在しない Chat の update は ChatNotFound で、行は追加されない
        // given (前提条件):
        let repo = InMemoryChatRepository::new();

        // when (操作):
        let result = repo.update(&saved_chat(ChatId::new(3), &[7])).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::ChatNotFound(ChatId::new(3))));
        assert!(repo.tables.lock().await.chat_users.is_empty());
    }

    #[tokio::test]
    async fn test_update_unsaved_chat_is_rejected() {
        // テスト項目: 未保存（ID なし）の Chat の update はエラーになる
        // given (前提条件):
        let repo = InMemoryChatRepository::new();

        // when (操作):
        let result = repo.update(&Chat::new(Timestamp::new(1000))).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Storage(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_chat_and_members_only_for_that_chat() {
        // テスト項目: delete で対象 Chat の行とメンバー行だけが削除される
        // given (前提条件):
        let repo = InMemoryChatRepository::new();
        let first = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        let second = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        repo.update(&saved_chat(first, &[7])).await.unwrap();
        repo.update(&saved_chat(second, &[9])).await.unwrap();

        // when (操作):
        repo.delete(first).await.unwrap();

        // then (期待する結果):
        assert_eq!(repo.get(first).await, Err(RepositoryError::ChatNotFound(first)));
        assert_eq!(repo.get(second).await.unwrap().user_ids, vec![UserId::new(9)]);
    }

    #[tokio::test]
    async fn test_read_committed_rolls_back_on_error() {
        // テスト項目: クロージャがエラーを返すと途中の変更は破棄される
        // given (前提条件):
        let repo = InMemoryChatRepository::new();
        let id = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        let before = repo.tables.lock().await.clone();

        // when (操作):
        let result: Result<(), _> = repo
            .read_committed(|tables| {
                tables.insert_chat_users(id.value(), &[UserId::new(7)]);
                Err(RepositoryError::Storage("bulk insert failed".to_string()))
            })
            .await;

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(*repo.tables.lock().await, before);
    }

    #[tokio::test]
    async fn test_read_committed_recovers_from_panic() {
        // テスト項目: クロージャ内の panic は捕捉され、ロールバックされてエラーになる
        // given (前提条件):
        let repo = InMemoryChatRepository::new();
        let id = repo.save(Chat::new(Timestamp::new(1000))).await.unwrap();
        let before = repo.tables.lock().await.clone();

        // when (操作):
        let result: Result<(), _> = repo
            .read_committed(|tables| {
                tables.delete_chat_users(id.value());
                tables.chats.clear();
                panic!("connection reset");
            })
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::Transaction("connection reset".to_string()))
        );
        assert_eq!(*repo.tables.lock().await, before);
        assert!(repo.get(id).await.is_ok());
    }
}
