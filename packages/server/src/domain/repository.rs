//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Chat, ChatId, RepositoryError};

/// Chat Repository trait
///
/// Persistence collaborator for chat membership. UseCase 層はこの trait に依存し、
/// Infrastructure 層の具体的な実装には依存しない。
///
/// `update` and `delete` are transactional: either every row change is
/// applied or none is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Chat を保存し、ストアが採番した ID を返す
    async fn save(&self, chat: Chat) -> Result<ChatId, RepositoryError>;

    /// Chat を取得（存在しない場合は `RepositoryError::ChatNotFound`）
    async fn get(&self, id: ChatId) -> Result<Chat, RepositoryError>;

    /// メンバー一覧を丸ごと置き換える（delete-then-bulk-insert）
    async fn update(&self, chat: &Chat) -> Result<(), RepositoryError>;

    /// メンバー行と Chat 行を削除
    async fn delete(&self, id: ChatId) -> Result<(), RepositoryError>;
}
