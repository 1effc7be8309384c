//! Region bounds of an untagged object (`/tuio2/bnd`).

use crate::domain::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    time::TuioTime,
    value_object::{Point, SessionId},
};

/// Oriented bounding ellipse of a region
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundsShape {
    pub width: f32,
    pub height: f32,
    pub area: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundsOptions {
    pub session_id: SessionId,
    pub position: Point,
    pub angle: f32,
    pub shape: BoundsShape,
    pub time: TuioTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    component: Component,
    shape: BoundsShape,
}

impl Bounds {
    pub fn new(options: BoundsOptions) -> Self {
        Self {
            component: Component::new(
                options.session_id,
                options.time,
                options.position,
                options.angle,
            ),
            shape: options.shape,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub fn shape(&self) -> BoundsShape {
        self.shape
    }

    pub fn update(
        &mut self,
        time: TuioTime,
        position: Point,
        angle: f32,
        shape: BoundsShape,
    ) -> Result<UpdateOutcome, TrackError> {
        let outcome = self.component.update(time, position, angle)?;
        if shape == self.shape {
            return Ok(outcome);
        }
        self.shape = shape;
        self.component.touch(time)?;
        Ok(UpdateOutcome::Changed)
    }

    pub fn update_from(&mut self, other: &Bounds) -> Result<UpdateOutcome, TrackError> {
        let outcome = self.component.update_from(&other.component)?;
        if self.shape != other.shape {
            self.shape = other.shape;
            let time = self.component.time();
            self.component.touch(time)?;
            return Ok(UpdateOutcome::Changed);
        }
        Ok(outcome)
    }
}
