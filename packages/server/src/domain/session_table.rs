//! Live-entity table: identity assignment and per-frame change sets.
//!
//! The table is plain synchronous state. Callers that share it between a
//! producer and a frame-commit path wrap it in a single mutex.

use std::collections::{BTreeMap, HashMap};

use super::{
    component::ComponentState,
    entity::{Entity, check_text},
    error::TrackError,
    observation::{NaturalKey, Observation},
    time::TuioTime,
    value_object::SessionId,
};

/// Everything that changed in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDelta {
    pub frame_id: u32,
    pub time: TuioTime,
    pub added: Vec<Entity>,
    pub updated: Vec<Entity>,
    pub removed: Vec<Entity>,
    /// Alive entities that did not change; only filled for full updates
    pub unchanged: Vec<Entity>,
    /// Session ids alive after this frame, ascending
    pub alive: Vec<SessionId>,
}

impl FrameDelta {
    /// No entity was added, updated or removed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Entities whose state goes on the wire, ordered by session id
    pub fn transmitted(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self
            .added
            .iter()
            .chain(self.updated.iter())
            .chain(self.unchanged.iter())
            .collect();
        entities.sort_by_key(|entity| entity.session_id());
        entities
    }
}

/// The single authority for entity identity within a tracking session
#[derive(Debug)]
pub struct SessionTable {
    entities: BTreeMap<SessionId, Entity>,
    keys: HashMap<NaturalKey, SessionId>,
    next_session_id: SessionId,
    frame_id: u32,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            keys: HashMap::new(),
            next_session_id: SessionId::FIRST,
            frame_id: 0,
        }
    }

    /// Number of entities in the table, including ones removed this frame
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Entity> {
        self.entities.get(&session_id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Session ids of entities that are not removed, ascending
    pub fn alive_ids(&self) -> Vec<SessionId> {
        self.entities
            .values()
            .filter(|entity| entity.component().is_alive())
            .map(Entity::session_id)
            .collect()
    }

    /// Some entity was added, updated or removed since the last frame
    pub fn has_changes(&self) -> bool {
        self.entities
            .values()
            .any(|entity| entity.component().state() != ComponentState::Idle)
    }

    /// Id of the last committed frame
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    fn allocate_session_id(&mut self) -> SessionId {
        let mut candidate = self.next_session_id;
        while self.entities.contains_key(&candidate) {
            candidate = candidate.next();
        }
        self.next_session_id = candidate.next();
        candidate
    }

    /// Create or update the entity matching the sample's natural key
    pub fn observe(&mut self, observation: &Observation) -> Result<SessionId, TrackError> {
        observation.sample.validate()?;
        let key = observation.sample.natural_key();

        if let Some(&session_id) = self.keys.get(&key) {
            let entity = self
                .entities
                .get_mut(&session_id)
                .ok_or(TrackError::UnknownSession(session_id))?;
            entity.apply(observation.time, &observation.sample)?;
            return Ok(session_id);
        }

        let session_id = self.allocate_session_id();
        let entity = Entity::from_sample(session_id, observation.time, &observation.sample);
        self.entities.insert(session_id, entity);
        self.keys.insert(key, session_id);
        tracing::debug!(
            "Session {} added ({})",
            session_id,
            observation.sample.kind()
        );
        Ok(session_id)
    }

    /// Adopt an externally constructed entity under its own session id.
    ///
    /// Tokens become reachable through their symbol key; other variants only
    /// through their session id.
    pub fn insert(&mut self, entity: Entity) -> Result<(), TrackError> {
        let session_id = entity.session_id();
        if self.entities.contains_key(&session_id) {
            return Err(TrackError::DuplicateSession(session_id));
        }
        if !entity.component().is_alive() {
            return Err(TrackError::ComponentRemoved(session_id));
        }
        if let Entity::Symbol(symbol) = &entity {
            check_text(symbol.group())?;
            check_text(symbol.data())?;
        }
        if let Entity::Token(token) = &entity {
            let key = NaturalKey::Token {
                symbol_id: token.symbol_id(),
                type_id: token.type_id(),
                user_id: token.user_id(),
            };
            self.keys.entry(key).or_insert(session_id);
        }
        self.entities.insert(session_id, entity);
        Ok(())
    }

    /// Mark an entity removed; it is reported once more, then purged
    pub fn retire(&mut self, session_id: SessionId) -> Result<(), TrackError> {
        let entity = self
            .entities
            .get_mut(&session_id)
            .ok_or(TrackError::UnknownSession(session_id))?;
        let time = entity.component().time();
        entity.component_mut().remove(time)?;
        self.keys.retain(|_, id| *id != session_id);
        tracing::debug!("Session {} removed", session_id);
        Ok(())
    }

    /// Freeze an entity's motion without moving it
    pub fn stop(&mut self, session_id: SessionId, time: TuioTime) -> Result<(), TrackError> {
        let entity = self
            .entities
            .get_mut(&session_id)
            .ok_or(TrackError::UnknownSession(session_id))?;
        entity.stop(time)?;
        Ok(())
    }

    /// Snapshot this frame's changes without touching the table.
    ///
    /// With `full_update` every unchanged alive entity is included as well.
    /// The snapshot only takes effect once passed to [`SessionTable::finish_frame`].
    pub fn snapshot_frame(&self, time: TuioTime, full_update: bool) -> FrameDelta {
        let mut added = Vec::new();
        let mut updated = Vec::new();
        let mut removed = Vec::new();
        let mut unchanged = Vec::new();

        for entity in self.entities.values() {
            match entity.component().state() {
                ComponentState::Added => added.push(entity.clone()),
                ComponentState::Updated => updated.push(entity.clone()),
                ComponentState::Removed => removed.push(entity.clone()),
                ComponentState::Idle if full_update => unchanged.push(entity.clone()),
                ComponentState::Idle => {}
            }
        }

        FrameDelta {
            frame_id: self.frame_id.wrapping_add(1),
            time,
            added,
            updated,
            removed,
            unchanged,
            alive: self.alive_ids(),
        }
    }

    /// Mark a snapshot as delivered: reset survivors to idle and purge
    /// removed entities.
    ///
    /// Must be called with the latest snapshot and no table mutation in
    /// between.
    pub fn finish_frame(&mut self, frame: &FrameDelta) {
        self.frame_id = frame.frame_id;
        self.entities
            .retain(|_, entity| entity.component().state() != ComponentState::Removed);
        for entity in self.entities.values_mut() {
            entity.component_mut().reset_state();
        }
    }

    /// Snapshot this frame's changes and apply them in one step
    pub fn take_frame(&mut self, time: TuioTime, full_update: bool) -> FrameDelta {
        let frame = self.snapshot_frame(time, full_update);
        self.finish_frame(&frame);
        frame
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entity::{BoundsShape, ComponentKind, Token, TokenOptions},
        observation::Sample,
        value_object::Point,
    };
    use std::collections::HashSet;

    fn secs(value: f64) -> TuioTime {
        TuioTime::from_secs_f64(value)
    }

    fn bounds(key: u64, time: TuioTime, x: f32) -> Observation {
        Observation::new(
            time,
            Sample::Bounds {
                key,
                position: Point::new(x, 0.5),
                angle: 0.0,
                shape: BoundsShape {
                    width: 0.1,
                    height: 0.1,
                    area: 0.01,
                },
            },
        )
    }

    #[test]
    fn test_observe_new_token_allocates_session() {
        // テスト項目: 新しいトークンの観測で新しいセッション ID が割り当てられる
        // given (前提条件):
        let mut table = SessionTable::new();

        // when (操作):
        let first = table
            .observe(&Observation::token(secs(0.0), 5, Point::new(0.1, 0.1), 0.0))
            .unwrap();
        let second = table
            .observe(&Observation::token(secs(0.0), 6, Point::new(0.5, 0.5), 0.0))
            .unwrap();

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(first).unwrap().component().state(),
            ComponentState::Added
        );
    }

    #[test]
    fn test_observe_same_key_updates_existing() {
        // テスト項目: 同じ自然キーの観測は既存のエンティティを更新する
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table
            .observe(&Observation::token(secs(0.0), 5, Point::new(0.1, 0.1), 0.0))
            .unwrap();

        // when (操作):
        let again = table
            .observe(&Observation::token(secs(1.0), 5, Point::new(0.2, 0.1), 0.0))
            .unwrap();

        // then (期待する結果):
        assert_eq!(session_id, again);
        assert_eq!(table.len(), 1);
        let component = table.get(session_id).unwrap().component();
        assert_eq!(component.position(), Point::new(0.2, 0.1));
    }

    #[test]
    fn test_correlation_keys_are_scoped_by_kind() {
        // テスト項目: 相関キーは種別ごとに独立している
        // given (前提条件):
        let mut table = SessionTable::new();
        let bounds_id = table.observe(&bounds(1, secs(0.0), 0.2)).unwrap();

        // when (操作):
        let pointer_id = table
            .observe(&Observation::new(
                secs(0.0),
                Sample::Pointer {
                    key: 1,
                    type_id: 0,
                    user_id: 0,
                    component_id: 0,
                    position: Point::new(0.2, 0.2),
                    angle: 0.0,
                    shape: Default::default(),
                },
            ))
            .unwrap();

        // then (期待する結果):
        assert_ne!(bounds_id, pointer_id);
        assert_eq!(table.get(pointer_id).unwrap().kind(), ComponentKind::Pointer);
    }

    #[test]
    fn test_rejected_sample_leaves_table_unchanged() {
        // テスト項目: 時刻が逆行するサンプルは拒否され、テーブルは変化しない
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table.observe(&bounds(7, secs(2.0), 0.2)).unwrap();
        let before = table.get(session_id).unwrap().clone();

        // when (操作):
        let result = table.observe(&bounds(7, secs(1.0), 0.8));

        // then (期待する結果):
        assert!(matches!(result, Err(TrackError::NonMonotonicTime { .. })));
        assert_eq!(table.get(session_id).unwrap(), &before);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique_among_live_entities() {
        // テスト項目: 生存中のエンティティ同士でセッション ID が重複しない
        // given (前提条件):
        let mut table = SessionTable::new();

        // when (操作): 追加と削除を繰り返す
        for round in 0..5u32 {
            for symbol in 0..10u32 {
                table
                    .observe(&Observation::token(
                        TuioTime::from_millis(i64::from(round)),
                        symbol + round * 3,
                        Point::new(0.5, 0.5),
                        0.0,
                    ))
                    .unwrap();
            }
            let ids = table.alive_ids();
            for id in ids.iter().take(4) {
                table.retire(*id).unwrap();
            }
            table.take_frame(TuioTime::from_millis(i64::from(round)), false);
        }

        // then (期待する結果):
        let ids = table.alive_ids();
        let unique: HashSet<SessionId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_insert_rejects_live_session_id() {
        // テスト項目: 生存中のセッション ID で外部生成エンティティを追加すると拒否される
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table
            .observe(&Observation::token(secs(0.0), 1, Point::new(0.1, 0.1), 0.0))
            .unwrap();
        let duplicate = Token::new(TokenOptions::abbreviated(
            session_id,
            2,
            Point::new(0.3, 0.3),
            0.0,
        ));

        // when (操作):
        let result = table.insert(Entity::Token(duplicate));

        // then (期待する結果):
        assert_eq!(result, Err(TrackError::DuplicateSession(session_id)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_allocation_skips_inserted_ids() {
        // テスト項目: 外部から追加された ID は自動割り当てで再利用されない
        // given (前提条件):
        let mut table = SessionTable::new();
        let taken = SessionId::new(1).unwrap();
        table
            .insert(Entity::Token(Token::new(TokenOptions::abbreviated(
                taken,
                42,
                Point::new(0.3, 0.3),
                0.0,
            ))))
            .unwrap();

        // when (操作):
        let allocated = table
            .observe(&Observation::token(secs(0.0), 7, Point::new(0.1, 0.1), 0.0))
            .unwrap();

        // then (期待する結果):
        assert_ne!(allocated, taken);
    }

    #[test]
    fn test_retire_reports_removal_exactly_once() {
        // テスト項目: 削除されたエンティティは次のフレームで一度だけ REMOVED として報告され、その後消える
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table.observe(&bounds(3, secs(0.0), 0.5)).unwrap();
        table.take_frame(secs(0.0), false);

        // when (操作):
        table.retire(session_id).unwrap();
        let first = table.take_frame(secs(0.1), false);
        let second = table.take_frame(secs(0.2), false);

        // then (期待する結果):
        assert_eq!(first.removed.len(), 1);
        assert_eq!(first.removed[0].session_id(), session_id);
        assert!(first.alive.is_empty());
        assert!(second.removed.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_retire_errors() {
        // テスト項目: 未知の ID や削除済み ID の retire はエラーになる
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table.observe(&bounds(3, secs(0.0), 0.5)).unwrap();
        table.retire(session_id).unwrap();
        let unknown = SessionId::new(999).unwrap();

        // when (操作):
        let twice = table.retire(session_id);
        let missing = table.retire(unknown);

        // then (期待する結果):
        assert_eq!(twice, Err(TrackError::ComponentRemoved(session_id)));
        assert_eq!(missing, Err(TrackError::UnknownSession(unknown)));
    }

    #[test]
    fn test_retired_key_gets_new_session() {
        // テスト項目: 削除直後に同じキーが観測されると新しいセッションとして追加される
        // given (前提条件):
        let mut table = SessionTable::new();
        let old = table
            .observe(&Observation::token(secs(0.0), 5, Point::new(0.1, 0.1), 0.0))
            .unwrap();
        table.retire(old).unwrap();

        // when (操作):
        let new = table
            .observe(&Observation::token(secs(0.1), 5, Point::new(0.1, 0.1), 0.0))
            .unwrap();
        let frame = table.take_frame(secs(0.1), false);

        // then (期待する結果):
        assert_ne!(old, new);
        assert_eq!(frame.removed.len(), 1);
        assert_eq!(frame.added.len(), 1);
        assert_eq!(frame.alive, vec![new]);
    }

    #[test]
    fn test_take_frame_resets_states_to_idle() {
        // テスト項目: フレーム確定後は生存エンティティが IDLE になり、次フレームの差分は空になる
        // given (前提条件):
        let mut table = SessionTable::new();
        table.observe(&bounds(1, secs(0.0), 0.2)).unwrap();
        table.observe(&bounds(2, secs(0.0), 0.4)).unwrap();

        // when (操作):
        let first = table.take_frame(secs(0.0), false);
        let second = table.take_frame(secs(0.1), false);

        // then (期待する結果):
        assert_eq!(first.added.len(), 2);
        assert!(second.is_empty());
        assert_eq!(second.alive.len(), 2);
        assert!(table
            .entities()
            .all(|e| e.component().state() == ComponentState::Idle));
        assert_eq!(second.frame_id, first.frame_id + 1);
    }

    #[test]
    fn test_full_update_includes_unchanged() {
        // テスト項目: full update では変化のないエンティティも送信対象に含まれる
        // given (前提条件):
        let mut table = SessionTable::new();
        table.observe(&bounds(1, secs(0.0), 0.2)).unwrap();
        table.observe(&bounds(2, secs(0.0), 0.4)).unwrap();
        table.take_frame(secs(0.0), false);
        table.observe(&bounds(2, secs(0.1), 0.6)).unwrap();

        // when (操作):
        let frame = table.take_frame(secs(0.1), true);

        // then (期待する結果):
        assert_eq!(frame.updated.len(), 1);
        assert_eq!(frame.unchanged.len(), 1);
        let transmitted: Vec<SessionId> =
            frame.transmitted().iter().map(|e| e.session_id()).collect();
        assert_eq!(transmitted, frame.alive);
    }

    #[test]
    fn test_stop_marks_entity_updated() {
        // テスト項目: stop で動いていたエンティティが UPDATED として報告される
        // given (前提条件):
        let mut table = SessionTable::new();
        let session_id = table.observe(&bounds(1, secs(0.0), 0.2)).unwrap();
        table.observe(&bounds(1, secs(1.0), 0.4)).unwrap();
        table.take_frame(secs(1.0), false);

        // when (操作):
        table.stop(session_id, secs(2.0)).unwrap();
        let frame = table.take_frame(secs(2.0), false);

        // then (期待する結果):
        assert_eq!(frame.updated.len(), 1);
        assert!(frame.updated[0].component().motion().is_zero());
    }

    #[test]
    fn test_snapshot_without_finish_keeps_changes() {
        // テスト項目: スナップショットだけでは状態が変わらず、同じ差分を再度取り出せる
        // given (前提条件):
        let mut table = SessionTable::new();
        let kept = table.observe(&bounds(1, secs(0.0), 0.2)).unwrap();
        let retired = table.observe(&bounds(2, secs(0.0), 0.4)).unwrap();
        table.take_frame(secs(0.0), false);
        table.observe(&bounds(1, secs(0.1), 0.3)).unwrap();
        table.retire(retired).unwrap();

        // when (操作):
        let abandoned = table.snapshot_frame(secs(0.1), false);
        let delivered = table.take_frame(secs(0.1), false);

        // then (期待する結果):
        assert_eq!(abandoned, delivered);
        assert_eq!(delivered.updated[0].session_id(), kept);
        assert_eq!(delivered.removed[0].session_id(), retired);
        assert_eq!(delivered.alive, vec![kept]);
        assert_eq!(table.frame_id(), delivered.frame_id);
    }

    #[test]
    fn test_symbol_with_nul_text_is_rejected() {
        // テスト項目: NUL を含むシンボルは観測時に拒否され、テーブルに入らない
        // given (前提条件):
        let mut table = SessionTable::new();
        let observation = Observation::new(
            secs(0.0),
            Sample::Symbol {
                key: 1,
                type_id: 0,
                user_id: 0,
                component_id: 0,
                group: "qr/url".to_string(),
                data: "a\0b".to_string(),
            },
        );

        // when (操作):
        let result = table.observe(&observation);

        // then (期待する結果):
        assert_eq!(result, Err(TrackError::NulInText("a\0b".to_string())));
        assert!(table.is_empty());
    }
}
