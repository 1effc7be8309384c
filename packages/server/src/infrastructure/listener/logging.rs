//! Listener that traces entity lifecycle events.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{Entity, FrameDelta, TuioListener};

/// Logs every lifecycle event at debug level and a frame summary at trace
#[derive(Debug, Default)]
pub struct LoggingListener {
    frames: AtomicU64,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames observed so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

fn describe(entity: &Entity) -> String {
    let component = entity.component();
    format!(
        "{} {} at ({:.3}, {:.3}) angle {:.3}",
        entity.kind(),
        entity.session_id(),
        component.x(),
        component.y(),
        component.angle()
    )
}

impl TuioListener for LoggingListener {
    fn entity_added(&self, entity: &Entity) {
        tracing::debug!("add {}", describe(entity));
    }

    fn entity_updated(&self, entity: &Entity) {
        let (vx, vy) = entity.component().velocity();
        tracing::debug!("set {} velocity ({:.3}, {:.3})", describe(entity), vx, vy);
    }

    fn entity_removed(&self, entity: &Entity) {
        tracing::debug!(
            "del {} {} after {:.3}s, path {:.3}",
            entity.kind(),
            entity.session_id(),
            entity.component().lifetime_secs(),
            entity.component().path_length()
        );
    }

    fn frame_committed(&self, frame: &FrameDelta) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            "frame {} at {} alive {:?}",
            frame.frame_id,
            frame.time,
            frame.alive.iter().map(|id| id.value()).collect::<Vec<_>>()
        );
    }
}
