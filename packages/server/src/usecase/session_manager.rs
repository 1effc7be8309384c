//! UseCase: セッション管理とフレーム配信
//!
//! ## 処理の流れ
//! - トラッキングソースが `observe` / `retire` / `stop` でテーブルを更新する
//! - フレーム境界で `commit_frame` が差分を確定し、エンコードしたバンドルを
//!   全ての Sender に渡したあと Listener に通知する
//!
//! ## ロック
//! - `table`: セッションテーブル本体。確定処理では差分の取り出しとエンコードの間だけ保持する
//! - `frame`: 最後に確定したフレーム時刻。確定処理の間ずっと保持し、
//!   フレームが生成順に各 Sender へ届くようにする

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    Entity, FrameDelta, Observation, OscSender, PacketEncoder, SessionId, SessionTable,
    TrackError, TuioListener, TuioTime,
};

use super::error::CommitError;

/// フレーム確定時の送信ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// 変化のないフレームでも frm + alv を送信する
    pub heartbeat: bool,
    /// 変化のない生存エンティティも毎フレーム送信する
    pub full_update: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            heartbeat: true,
            full_update: false,
        }
    }
}

pub struct SessionManager {
    table: Mutex<SessionTable>,
    frame: Mutex<TuioTime>,
    encoder: Arc<dyn PacketEncoder>,
    senders: Mutex<Vec<Arc<dyn OscSender>>>,
    listeners: Mutex<Vec<Arc<dyn TuioListener>>>,
    options: SessionOptions,
}

impl SessionManager {
    pub fn new(encoder: Arc<dyn PacketEncoder>, options: SessionOptions) -> Self {
        Self {
            table: Mutex::new(SessionTable::new()),
            frame: Mutex::new(TuioTime::UNDEFINED),
            encoder,
            senders: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            options,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub async fn add_sender(&self, sender: Arc<dyn OscSender>) {
        tracing::info!("Sender added: {}", sender.kind());
        self.senders.lock().await.push(sender);
    }

    pub async fn senders(&self) -> Vec<Arc<dyn OscSender>> {
        self.senders.lock().await.clone()
    }

    pub async fn add_listener(&self, listener: Arc<dyn TuioListener>) {
        self.listeners.lock().await.push(listener);
    }

    /// Returns whether the listener was registered
    pub async fn remove_listener(&self, listener: &Arc<dyn TuioListener>) -> bool {
        let mut listeners = self.listeners.lock().await;
        let before = listeners.len();
        listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
        listeners.len() != before
    }

    /// 観測を反映し、対応するセッション ID を返す
    pub async fn observe(&self, observation: &Observation) -> Result<SessionId, TrackError> {
        self.table.lock().await.observe(observation)
    }

    pub async fn retire(&self, session_id: SessionId) -> Result<(), TrackError> {
        self.table.lock().await.retire(session_id)
    }

    pub async fn stop(&self, session_id: SessionId, time: TuioTime) -> Result<(), TrackError> {
        self.table.lock().await.stop(session_id, time)
    }

    /// 削除済み（次フレームで報告予定）を除いた生存エンティティ数
    pub async fn live_count(&self) -> usize {
        self.table.lock().await.alive_ids().len()
    }

    pub async fn entity(&self, session_id: SessionId) -> Option<Entity> {
        self.table.lock().await.get(session_id).cloned()
    }

    pub async fn entities(&self) -> Vec<Entity> {
        self.table.lock().await.entities().cloned().collect()
    }

    /// フレームを確定して配信する
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - 送信したフレームの差分
    /// * `Ok(None)` - 変化がなく heartbeat も無効なため送信しなかった
    /// * `Err(CommitError)` - フレーム時刻の逆行またはエンコード失敗
    pub async fn commit_frame(&self, time: TuioTime) -> Result<Option<FrameDelta>, CommitError> {
        let mut last_commit = self.frame.lock().await;
        if time < *last_commit {
            return Err(CommitError::NonMonotonicFrame {
                previous: *last_commit,
                given: time,
            });
        }

        // 1. 差分の取り出しとエンコード。エンコードに成功した場合だけテーブルを進める
        let (frame, bundle) = {
            let mut table = self.table.lock().await;
            if !self.options.heartbeat && !table.has_changes() {
                *last_commit = time;
                return Ok(None);
            }
            let frame = table.snapshot_frame(time, self.options.full_update);
            let bundle = self.encoder.encode(&frame)?;
            table.finish_frame(&frame);
            (frame, bundle)
        };
        *last_commit = time;

        // 2. 全ての Sender に配信
        let senders = self.senders.lock().await.clone();
        for sender in senders.iter().filter(|sender| sender.is_open()) {
            match sender.send(&bundle).await {
                Ok(peers) => tracing::trace!(
                    "Frame {} sent to {} {} peer(s)",
                    frame.frame_id,
                    peers,
                    sender.kind()
                ),
                Err(e) => tracing::warn!(
                    "Failed to send frame {} via {}: {}",
                    frame.frame_id,
                    sender.kind(),
                    e
                ),
            }
        }

        // 3. Listener に通知
        let listeners = self.listeners.lock().await.clone();
        for listener in &listeners {
            frame.added.iter().for_each(|entity| listener.entity_added(entity));
            frame.updated.iter().for_each(|entity| listener.entity_updated(entity));
            frame.removed.iter().for_each(|entity| listener.entity_removed(entity));
            listener.frame_committed(&frame);
        }

        tracing::debug!(
            "Frame {} committed: {} added, {} updated, {} removed, {} alive",
            frame.frame_id,
            frame.added.len(),
            frame.updated.len(),
            frame.removed.len(),
            frame.alive.len()
        );
        Ok(Some(frame))
    }

    /// 全ての Sender を閉じる
    pub async fn close(&self) {
        let senders = self.senders.lock().await.clone();
        for sender in senders {
            sender.close().await;
        }
    }
}
