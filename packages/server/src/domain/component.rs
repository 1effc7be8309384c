//! Shared state and motion math common to every tracked entity variant.

use std::collections::VecDeque;

use super::{
    error::TrackError,
    time::{TuioTime, delta_secs},
    value_object::{Point, SessionId, angle_difference, normalize_angle},
};

/// Maximum number of sampled positions kept in a component's path
pub const MAX_PATH_LENGTH: usize = 128;

/// Lifecycle state of a component within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Created since the last committed frame
    Added,
    /// Changed since the last committed frame
    Updated,
    /// Unchanged since the last committed frame
    Idle,
    /// Reported gone; terminal
    Removed,
}

/// Result of applying a sample to a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Changed,
    Unchanged,
}

/// Derived motion of a component, recomputed on every changing sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub x_speed: f32,
    pub y_speed: f32,
    pub motion_speed: f32,
    pub motion_accel: f32,
    /// Radians per second
    pub rotation_speed: f32,
    pub rotation_accel: f32,
}

impl Motion {
    pub fn is_zero(&self) -> bool {
        *self == Motion::default()
    }
}

/// Base state of one tracked entity
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    session_id: SessionId,
    time: TuioTime,
    start_time: TuioTime,
    position: Point,
    angle: f32,
    motion: Motion,
    state: ComponentState,
    path_length: f32,
    path: VecDeque<Point>,
}

impl Component {
    /// Create a component first observed at `time`.
    ///
    /// An undefined `time` is treated as session start.
    pub fn new(session_id: SessionId, time: TuioTime, position: Point, angle: f32) -> Self {
        let time = time.or(TuioTime::ZERO);
        let mut path = VecDeque::with_capacity(MAX_PATH_LENGTH);
        path.push_back(position);
        Self {
            session_id,
            time,
            start_time: time,
            position,
            angle: normalize_angle(angle),
            motion: Motion::default(),
            state: ComponentState::Added,
            path_length: 0.0,
            path,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn time(&self) -> TuioTime {
        self.time
    }

    pub fn start_time(&self) -> TuioTime {
        self.start_time
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Velocity vector in normalized units per second
    pub fn velocity(&self) -> (f32, f32) {
        (self.motion.x_speed, self.motion.y_speed)
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state != ComponentState::Removed
    }

    /// Cumulative distance traveled since creation
    pub fn path_length(&self) -> f32 {
        self.path_length
    }

    /// Most recent sampled positions, oldest first
    pub fn path(&self) -> &VecDeque<Point> {
        &self.path
    }

    /// Time elapsed since creation, in seconds
    pub fn lifetime_secs(&self) -> f32 {
        delta_secs(self.time - self.start_time)
    }

    fn check_sample(&self, time: TuioTime) -> Result<(), TrackError> {
        if self.state == ComponentState::Removed {
            return Err(TrackError::ComponentRemoved(self.session_id));
        }
        if time < self.time {
            return Err(TrackError::NonMonotonicTime {
                session_id: self.session_id,
                current: self.time,
                given: time,
            });
        }
        Ok(())
    }

    fn record_path(&mut self, position: Point) {
        self.path_length += self.position.distance_to(&position);
        if self.path.len() >= MAX_PATH_LENGTH {
            self.path.pop_front();
        }
        self.path.push_back(position);
    }

    fn mark_updated(&mut self) {
        if self.state == ComponentState::Idle {
            self.state = ComponentState::Updated;
        }
    }

    /// Apply a new position/angle sample taken at `time`.
    ///
    /// Motion is derived from the previous sample by finite differences. A
    /// sample at the same time as the previous one moves the component but
    /// keeps the previous motion.
    pub fn update(
        &mut self,
        time: TuioTime,
        position: Point,
        angle: f32,
    ) -> Result<UpdateOutcome, TrackError> {
        self.check_sample(time)?;

        let angle = normalize_angle(angle);
        if position == self.position && angle == self.angle {
            self.time = time;
            return Ok(UpdateOutcome::Unchanged);
        }

        let dt = delta_secs(time - self.time);
        let distance = self.position.distance_to(&position);

        if dt > 0.0 {
            let last = self.motion;
            let x_speed = (position.x - self.position.x) / dt;
            let y_speed = (position.y - self.position.y) / dt;
            let motion_speed = distance / dt;
            let rotation_speed = angle_difference(self.angle, angle) / dt;
            self.motion = Motion {
                x_speed,
                y_speed,
                motion_speed,
                motion_accel: (motion_speed - last.motion_speed) / dt,
                rotation_speed,
                rotation_accel: (rotation_speed - last.rotation_speed) / dt,
            };
        }

        self.record_path(position);

        self.position = position;
        self.angle = angle;
        self.time = time;
        self.mark_updated();
        Ok(UpdateOutcome::Changed)
    }

    /// Mark the component as motionless at its current position
    pub fn stop(&mut self, time: TuioTime) -> Result<UpdateOutcome, TrackError> {
        self.check_sample(time)?;
        self.time = time;
        if self.motion.is_zero() {
            return Ok(UpdateOutcome::Unchanged);
        }
        self.motion = Motion::default();
        self.mark_updated();
        Ok(UpdateOutcome::Changed)
    }

    /// Copy spatial state and motion from `other`, keeping this component's
    /// own identity and clock
    pub fn update_from(&mut self, other: &Component) -> Result<UpdateOutcome, TrackError> {
        self.check_sample(self.time)?;
        if self.position == other.position
            && self.angle == other.angle
            && self.motion == other.motion
        {
            return Ok(UpdateOutcome::Unchanged);
        }
        self.record_path(other.position);
        self.position = other.position;
        self.angle = other.angle;
        self.motion = other.motion;
        self.mark_updated();
        Ok(UpdateOutcome::Changed)
    }

    /// Mark the component as gone; no further mutation is accepted
    pub fn remove(&mut self, time: TuioTime) -> Result<(), TrackError> {
        self.check_sample(time)?;
        self.time = time;
        self.state = ComponentState::Removed;
        Ok(())
    }

    /// Start a new frame: pending changes have been reported
    pub(crate) fn reset_state(&mut self) {
        if matches!(self.state, ComponentState::Added | ComponentState::Updated) {
            self.state = ComponentState::Idle;
        }
    }

    /// Advance the clock without changing anything else
    pub(crate) fn advance(&mut self, time: TuioTime) -> Result<(), TrackError> {
        self.check_sample(time)?;
        self.time = time;
        Ok(())
    }

    /// Flag a variant-specific payload change
    pub(crate) fn touch(&mut self, time: TuioTime) -> Result<(), TrackError> {
        self.check_sample(time)?;
        self.time = time;
        self.mark_updated();
        Ok(())
    }

    /// Reject samples that would violate the component's invariants
    pub(crate) fn validate(&self, time: TuioTime) -> Result<(), TrackError> {
        self.check_sample(time)
    }
}
