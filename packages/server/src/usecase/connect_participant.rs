//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - Chat のメンバー一覧への追加と永続化
//!
//! ### なぜこのテストが必要か
//! - 同じユーザーが何度接続してもメンバーは 1 件であることを保証
//! - ストアの ChatNotFound が NotFound として扱われることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規メンバーの接続
//! - エッジケース：既存メンバーの再接続
//! - 異常系：存在しない Chat への接続、更新失敗

use std::sync::Arc;

use crate::domain::{ChatId, ChatRepository, UserId};

use super::error::ServiceError;

/// 参加者接続のユースケース
///
/// ルームが稼働中かどうかの確認はトランスポート側で先に行います。
/// ここではメンバー一覧の更新だけを扱います。
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 参加者接続を実行
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - 新しくメンバーに追加された場合 `true`
    /// * `Err(ServiceError)` - Chat が存在しない、または更新に失敗
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, ServiceError> {
        let mut chat = self.repository.get(chat_id).await?;
        let added = chat.connect(user_id);
        self.repository.update(&chat).await?;

        if added {
            tracing::info!("user joined chat membership");
        }
        Ok(added)
    }
}
