//! Touch or pen pointer (`/tuio2/ptr`).

use crate::domain::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    time::{TuioTime, delta_secs},
    value_object::{Point, SessionId, encode_type_user_id},
};

/// Pointer-specific sample values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerShape {
    pub shear: f32,
    pub radius: f32,
    pub pressure: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerOptions {
    pub session_id: SessionId,
    pub type_id: u16,
    pub user_id: u16,
    pub component_id: u32,
    pub position: Point,
    pub angle: f32,
    pub shape: PointerShape,
    pub time: TuioTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    component: Component,
    type_id: u16,
    user_id: u16,
    component_id: u32,
    shape: PointerShape,
    pressure_speed: f32,
    pressure_accel: f32,
}

impl Pointer {
    pub fn new(options: PointerOptions) -> Self {
        Self {
            component: Component::new(
                options.session_id,
                options.time,
                options.position,
                options.angle,
            ),
            type_id: options.type_id,
            user_id: options.user_id,
            component_id: options.component_id,
            shape: options.shape,
            pressure_speed: 0.0,
            pressure_accel: 0.0,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub fn type_user_id(&self) -> u32 {
        encode_type_user_id(self.type_id, self.user_id)
    }

    pub fn component_id(&self) -> u32 {
        self.component_id
    }

    pub fn shape(&self) -> PointerShape {
        self.shape
    }

    pub fn pressure_speed(&self) -> f32 {
        self.pressure_speed
    }

    pub fn pressure_accel(&self) -> f32 {
        self.pressure_accel
    }

    /// Apply a sample; pressure motion is derived like positional motion
    pub fn update(
        &mut self,
        time: TuioTime,
        position: Point,
        angle: f32,
        shape: PointerShape,
    ) -> Result<UpdateOutcome, TrackError> {
        self.component.validate(time)?;
        let dt = delta_secs(time - self.component.time());
        let outcome = self.component.update(time, position, angle)?;

        if shape == self.shape {
            return Ok(outcome);
        }
        if dt > 0.0 {
            let speed = (shape.pressure - self.shape.pressure) / dt;
            self.pressure_accel = (speed - self.pressure_speed) / dt;
            self.pressure_speed = speed;
        }
        self.shape = shape;
        self.component.touch(time)?;
        Ok(UpdateOutcome::Changed)
    }

    pub fn stop(&mut self, time: TuioTime) -> Result<UpdateOutcome, TrackError> {
        let outcome = self.component.stop(time)?;
        if self.pressure_speed != 0.0 || self.pressure_accel != 0.0 {
            self.pressure_speed = 0.0;
            self.pressure_accel = 0.0;
            self.component.touch(time)?;
            return Ok(UpdateOutcome::Changed);
        }
        Ok(outcome)
    }

    pub fn update_from(&mut self, other: &Pointer) -> Result<UpdateOutcome, TrackError> {
        let outcome = self.component.update_from(&other.component)?;
        self.type_id = other.type_id;
        self.user_id = other.user_id;
        self.component_id = other.component_id;
        self.shape = other.shape;
        self.pressure_speed = other.pressure_speed;
        self.pressure_accel = other.pressure_accel;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer_at(time: TuioTime, pressure: f32) -> Pointer {
        Pointer::new(PointerOptions {
            session_id: SessionId::new(4).unwrap(),
            type_id: 1,
            user_id: 0,
            component_id: 0,
            position: Point::new(0.5, 0.5),
            angle: 0.0,
            shape: PointerShape {
                shear: 0.0,
                radius: 0.01,
                pressure,
            },
            time,
        })
    }

    #[test]
    fn test_pressure_change_alone_is_an_update() {
        // テスト項目: 位置が同じでも圧力が変われば更新として扱われ、圧力速度が求められる
        // given (前提条件):
        let mut pointer = pointer_at(TuioTime::ZERO, 0.2);
        pointer.component_mut().reset_state();

        // when (操作):
        let outcome = pointer
            .update(
                TuioTime::from_millis(500),
                Point::new(0.5, 0.5),
                0.0,
                PointerShape {
                    shear: 0.0,
                    radius: 0.01,
                    pressure: 0.7,
                },
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, UpdateOutcome::Changed);
        assert!((pointer.pressure_speed() - 1.0).abs() < 1e-5);
        assert_eq!(pointer.type_user_id(), 0x0001_0000);
    }

    #[test]
    fn test_stop_clears_pressure_motion() {
        // テスト項目: stop で圧力速度もゼロになる
        // given (前提条件):
        let mut pointer = pointer_at(TuioTime::ZERO, 0.0);
        let shape = PointerShape {
            shear: 0.0,
            radius: 0.01,
            pressure: 1.0,
        };
        pointer
            .update(TuioTime::from_millis(100), Point::new(0.5, 0.5), 0.0, shape)
            .unwrap();

        // when (操作):
        pointer.stop(TuioTime::from_millis(200)).unwrap();

        // then (期待する結果):
        assert_eq!(pointer.pressure_speed(), 0.0);
        assert_eq!(pointer.pressure_accel(), 0.0);
        assert_eq!(pointer.shape().pressure, 1.0);
    }
}
