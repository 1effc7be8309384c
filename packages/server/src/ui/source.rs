//! Tracking input handler: decodes JSON-lines events and drives the
//! session manager.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    domain::{Clock, TrackError},
    infrastructure::dto::{SourceCommand, SourceError, SourceEvent},
    usecase::{CommitError, SessionManager},
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Apply one input line
pub async fn handle_line(
    line: &str,
    manager: &SessionManager,
    clock: &dyn Clock,
) -> Result<(), FeedError> {
    let command = SourceEvent::parse(line)?.into_command(clock.now())?;
    match command {
        SourceCommand::Observe(observation) => {
            manager.observe(&observation).await?;
        }
        SourceCommand::Retire(session_id) => manager.retire(session_id).await?,
        SourceCommand::Stop(session_id, time) => manager.stop(session_id, time).await?,
        SourceCommand::Commit(time) => {
            manager.commit_frame(time).await?;
        }
    }
    Ok(())
}

/// Read events until end of input. Malformed or rejected lines are logged
/// and skipped. Returns the number of lines applied.
pub async fn run_source<R: AsyncBufRead + Unpin>(
    reader: R,
    manager: &SessionManager,
    clock: &dyn Clock,
) -> std::io::Result<usize> {
    let mut lines = reader.lines();
    let mut applied = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match handle_line(&line, manager, clock).await {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!("Skipping source line {:?}: {}", line, e),
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ComponentKind, FixedClock, PacketEncoder, TuioTime},
        infrastructure::encoder::{Dimension, SourceDescriptor, Tuio2Encoder},
        usecase::SessionOptions,
    };
    use std::sync::Arc;

    fn create_manager() -> SessionManager {
        let encoder: Arc<dyn PacketEncoder> = Arc::new(Tuio2Encoder::new(
            SourceDescriptor::new("test"),
            Dimension::default(),
            tuio_shared::time::now_utc(),
        ));
        SessionManager::new(encoder, SessionOptions::default())
    }

    #[tokio::test]
    async fn test_run_source_applies_valid_lines() {
        // テスト項目: 正しい行は適用され、不正な行はスキップされる
        // given (前提条件):
        let manager = create_manager();
        let clock = FixedClock::new(TuioTime::from_millis(100));
        let input: &[u8] = br#"{"kind":"token","symbol_id":5,"x":0.1,"y":0.1}
not json

{"kind":"pointer","key":1,"x":0.5,"y":0.5,"pressure":0.8}
{"kind":"retire","session_id":99}
{"kind":"commit"}
"#;

        // when (操作):
        let applied = run_source(input, &manager, &clock).await.unwrap();

        // then (期待する結果):
        assert_eq!(applied, 3);
        let kinds: Vec<ComponentKind> = manager
            .entities()
            .await
            .iter()
            .map(|e| e.kind())
            .collect();
        assert_eq!(kinds, vec![ComponentKind::Token, ComponentKind::Pointer]);
    }

    #[tokio::test]
    async fn test_handle_line_reports_rejections() {
        // テスト項目: 時刻が逆行するサンプルは Track エラーとして報告される
        // given (前提条件):
        let manager = create_manager();
        let clock = FixedClock::new(TuioTime::ZERO);
        handle_line(
            r#"{"kind":"bounds","key":1,"x":0.5,"y":0.5,"time":2.0}"#,
            &manager,
            &clock,
        )
        .await
        .unwrap();

        // when (操作):
        let result = handle_line(
            r#"{"kind":"bounds","key":1,"x":0.6,"y":0.5,"time":1.0}"#,
            &manager,
            &clock,
        )
        .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(FeedError::Track(TrackError::NonMonotonicTime { .. }))
        ));
    }
}
