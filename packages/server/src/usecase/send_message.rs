//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 稼働中ルームの確認、本文の検証、ハンドオフキューへの投入
//!
//! ### なぜこのテストが必要か
//! - 稼働していないルームへの送信は NotFound で拒否されることを保証
//! - 空や長すぎる本文はルームに渡る前に拒否されることを確認
//! - 送信中にルームが閉じられた場合に待ち続けないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：稼働中ルームへの送信
//! - 異常系：ルームなし、本文不正、送信中のルーム close

use std::sync::Arc;

use engawa_shared::time::Clock;

use crate::domain::{
    ChatId, ChatMessage, MessageText, RoomDirectory, RoomError, Timestamp, UserId,
};

use super::error::ServiceError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// 稼働中ルームの参照先
    rooms: Arc<dyn RoomDirectory>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(rooms: Arc<dyn RoomDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { rooms, clock }
    }

    /// メッセージ送信を実行
    ///
    /// ルームのキューに渡った時点で成功とします。配信はルームのドライバーが
    /// 行い、個々の参加者への到達は保証しません。
    #[tracing::instrument(skip(self, text))]
    pub async fn execute(
        &self,
        chat_id: ChatId,
        from: UserId,
        text: String,
    ) -> Result<(), ServiceError> {
        let room = self
            .rooms
            .find_room(chat_id)
            .await
            .ok_or(ServiceError::RoomNotLive(chat_id))?;

        let text = MessageText::new(text)?;
        let message = ChatMessage::new(from, text, Timestamp::new(self.clock.now_millis()));

        room.enqueue(message).await.map_err(|e| match e {
            RoomError::Closed(id) => ServiceError::RoomClosed(id),
        })?;

        tracing::debug!("message handed to room");
        Ok(())
    }
}
