//! Value objects shared by all component variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::TrackError;

/// Identifier of one entity's continuous track.
///
/// Carried on the wire as an OSC int32, so valid ids are `0..=i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u32);

impl SessionId {
    pub const MAX: u32 = i32::MAX as u32;

    /// First id handed out by a fresh session table
    pub const FIRST: SessionId = SessionId(1);

    pub fn new(value: i64) -> Result<Self, TrackError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u32))
        } else {
            Err(TrackError::InvalidSessionId(value))
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Next id in allocation order, wrapping past `MAX` back to 0
    pub fn next(&self) -> SessionId {
        if self.0 >= Self::MAX {
            SessionId(0)
        } else {
            SessionId(self.0 + 1)
        }
    }
}

impl TryFrom<i64> for SessionId {
    type Error = TrackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized 2D position in `[0, 1]` space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction from this point towards `other`, in radians within `[0, 2π)`
    pub fn angle_to(&self, other: &Point) -> f32 {
        normalize_angle((other.y - self.y).atan2(other.x - self.x))
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed difference `to - from`, in `(-π, π]`
pub fn angle_difference(from: f32, to: f32) -> f32 {
    let mut diff = (to - from).rem_euclid(std::f32::consts::TAU);
    if diff > std::f32::consts::PI {
        diff -= std::f32::consts::TAU;
    }
    diff
}

/// Pack type and user ids into the wire-level `tu_id` field.
///
/// Layout: bits 31..16 carry `type_id`, bits 15..0 carry `user_id`.
pub fn encode_type_user_id(type_id: u16, user_id: u16) -> u32 {
    (u32::from(type_id) << 16) | u32::from(user_id)
}

/// Exact inverse of [`encode_type_user_id`]
pub fn decode_type_user_id(type_user_id: u32) -> (u16, u16) {
    ((type_user_id >> 16) as u16, (type_user_id & 0xFFFF) as u16)
}
