//! Tagged tangible token (`/tuio2/tok`).

use crate::domain::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    time::TuioTime,
    value_object::{Point, SessionId, decode_type_user_id, encode_type_user_id},
};

/// Construction parameters for a [`Token`].
///
/// Omitted identity fields default to zero and an omitted time to session start.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenOptions {
    pub session_id: SessionId,
    pub symbol_id: u32,
    pub type_id: u16,
    pub user_id: u16,
    pub position: Point,
    pub angle: f32,
    pub time: TuioTime,
}

impl TokenOptions {
    /// Session, type, user and symbol ids all supplied
    pub fn full(
        session_id: SessionId,
        type_id: u16,
        user_id: u16,
        symbol_id: u32,
        position: Point,
        angle: f32,
    ) -> Self {
        Self {
            session_id,
            symbol_id,
            type_id,
            user_id,
            position,
            angle,
            time: TuioTime::UNDEFINED,
        }
    }

    /// Session and symbol ids only; type and user ids are zero
    pub fn abbreviated(session_id: SessionId, symbol_id: u32, position: Point, angle: f32) -> Self {
        Self::full(session_id, 0, 0, symbol_id, position, angle)
    }

    pub fn at(mut self, time: TuioTime) -> Self {
        self.time = time;
        self
    }
}

/// A physical tag identified by its symbol, e.g. a fiducial marker
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    component: Component,
    symbol_id: u32,
    type_id: u16,
    user_id: u16,
}

impl Token {
    pub fn new(options: TokenOptions) -> Self {
        Self {
            component: Component::new(
                options.session_id,
                options.time,
                options.position,
                options.angle,
            ),
            symbol_id: options.symbol_id,
            type_id: options.type_id,
            user_id: options.user_id,
        }
    }

    /// Independent token carrying this token's symbol, ids, position and
    /// angle under a new identity
    pub fn duplicate(&self, session_id: SessionId, time: TuioTime) -> Token {
        Token::new(
            TokenOptions::full(
                session_id,
                self.type_id,
                self.user_id,
                self.symbol_id,
                self.component.position(),
                self.component.angle(),
            )
            .at(time),
        )
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub fn session_id(&self) -> SessionId {
        self.component.session_id()
    }

    pub fn symbol_id(&self) -> u32 {
        self.symbol_id
    }

    pub fn type_id(&self) -> u16 {
        self.type_id
    }

    pub fn user_id(&self) -> u16 {
        self.user_id
    }

    /// Packed `tu_id` wire field
    pub fn type_user_id(&self) -> u32 {
        encode_type_user_id(self.type_id, self.user_id)
    }

    pub fn set_type_user_id(&mut self, type_user_id: u32) {
        let (type_id, user_id) = decode_type_user_id(type_user_id);
        self.type_id = type_id;
        self.user_id = user_id;
    }

    pub fn update(
        &mut self,
        time: TuioTime,
        position: Point,
        angle: f32,
    ) -> Result<UpdateOutcome, TrackError> {
        self.component.update(time, position, angle)
    }

    pub fn stop(&mut self, time: TuioTime) -> Result<UpdateOutcome, TrackError> {
        self.component.stop(time)
    }

    /// Take over another token's symbol, ids and spatial state without
    /// advancing this token's clock
    pub fn update_from(&mut self, other: &Token) -> Result<UpdateOutcome, TrackError> {
        let ids_changed = self.symbol_id != other.symbol_id
            || self.type_user_id() != other.type_user_id();
        let outcome = self.component.update_from(&other.component)?;
        self.symbol_id = other.symbol_id;
        self.type_id = other.type_id;
        self.user_id = other.user_id;
        if ids_changed && outcome == UpdateOutcome::Unchanged {
            let time = self.component.time();
            self.component.touch(time)?;
            return Ok(UpdateOutcome::Changed);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::ComponentState;

    fn session(id: i64) -> SessionId {
        SessionId::new(id).unwrap()
    }

    #[test]
    fn test_abbreviated_form_defaults_type_and_user() {
        // テスト項目: 省略形の生成では type_id / user_id が 0 になる
        // given (前提条件):
        let options = TokenOptions::abbreviated(session(1), 5, Point::new(0.1, 0.2), 0.5);

        // when (操作):
        let token = Token::new(options);

        // then (期待する結果):
        assert_eq!(token.symbol_id(), 5);
        assert_eq!(token.type_id(), 0);
        assert_eq!(token.user_id(), 0);
        assert_eq!(token.type_user_id(), 0);
        assert_eq!(token.component().time(), TuioTime::ZERO);
    }

    #[test]
    fn test_construction_forms_converge() {
        // テスト項目: 完全形と省略形が同じ内部表現に収束する
        // given (前提条件):
        let full = TokenOptions::full(session(1), 0, 0, 5, Point::new(0.1, 0.2), 0.5);
        let abbreviated = TokenOptions::abbreviated(session(1), 5, Point::new(0.1, 0.2), 0.5);

        // when (操作):
        let a = Token::new(full);
        let b = Token::new(abbreviated);

        // then (期待する結果):
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_type_user_id_is_inverse_of_getter() {
        // テスト項目: set_type_user_id は type_user_id の逆写像になる
        // given (前提条件):
        let mut token = Token::new(TokenOptions::full(
            session(1),
            0x1234,
            0xABCD,
            7,
            Point::default(),
            0.0,
        ));
        let packed = token.type_user_id();

        // when (操作):
        token.set_type_user_id(0);
        token.set_type_user_id(packed);

        // then (期待する結果):
        assert_eq!(token.type_id(), 0x1234);
        assert_eq!(token.user_id(), 0xABCD);
        assert_eq!(token.type_user_id(), packed);
    }

    #[test]
    fn test_duplicate_is_independent() {
        // テスト項目: duplicate は新しい ID を持つ独立したトークンを生成する
        // given (前提条件):
        let original = Token::new(
            TokenOptions::full(session(1), 2, 3, 9, Point::new(0.4, 0.6), 1.0)
                .at(TuioTime::from_millis(100)),
        );

        // when (操作):
        let mut copy = original.duplicate(session(8), TuioTime::from_millis(500));
        copy.update(TuioTime::from_millis(600), Point::new(0.9, 0.9), 1.0)
            .unwrap();

        // then (期待する結果):
        assert_eq!(copy.session_id(), session(8));
        assert_eq!(copy.symbol_id(), 9);
        assert_eq!(copy.type_user_id(), original.type_user_id());
        assert_eq!(copy.component().start_time(), TuioTime::from_millis(500));
        assert_eq!(original.component().position(), Point::new(0.4, 0.6));
    }

    #[test]
    fn test_update_from_copies_ids_and_keeps_time() {
        // テスト項目: update_from でシンボルと ID を引き継ぎ、時刻は維持される
        // given (前提条件):
        let mut target = Token::new(
            TokenOptions::abbreviated(session(1), 5, Point::new(0.1, 0.1), 0.0)
                .at(TuioTime::from_millis(10)),
        );
        target.component_mut().reset_state();
        let source = Token::new(TokenOptions::full(
            session(2),
            1,
            4,
            6,
            Point::new(0.1, 0.1),
            0.0,
        ));

        // when (操作):
        let outcome = target.update_from(&source).unwrap();

        // then (期待する結果):
        assert_eq!(outcome, UpdateOutcome::Changed);
        assert_eq!(target.symbol_id(), 6);
        assert_eq!(target.user_id(), 4);
        assert_eq!(target.session_id(), session(1));
        assert_eq!(target.component().time(), TuioTime::from_millis(10));
        assert_eq!(target.component().state(), ComponentState::Updated);
    }
}
