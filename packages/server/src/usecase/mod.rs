//! UseCase 層: セッションテーブルの操作とフレーム配信

pub mod error;
pub mod session_manager;

pub use error::CommitError;
pub use session_manager::{SessionManager, SessionOptions};
