//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{EncodeError, TuioTime};

/// フレーム確定処理のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    /// フレーム時刻が前回の確定時刻より前
    #[error("frame time {given} is earlier than the last committed frame time {previous}")]
    NonMonotonicFrame { previous: TuioTime, given: TuioTime },

    /// バンドルのエンコードに失敗
    #[error("failed to encode frame: {0}")]
    Encode(#[from] EncodeError),
}
