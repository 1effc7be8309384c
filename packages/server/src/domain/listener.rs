//! Callbacks notified after each committed frame.

use super::{entity::Entity, session_table::FrameDelta};

/// Receives entity lifecycle events in commit order.
///
/// All methods default to no-ops so implementors pick what they need.
pub trait TuioListener: Send + Sync {
    fn entity_added(&self, _entity: &Entity) {}

    fn entity_updated(&self, _entity: &Entity) {}

    fn entity_removed(&self, _entity: &Entity) {}

    /// Called once per committed frame, after the per-entity callbacks
    fn frame_committed(&self, _frame: &FrameDelta) {}
}
