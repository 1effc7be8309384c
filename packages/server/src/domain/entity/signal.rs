//! Signal between components (`/tuio2/sig`).

use crate::domain::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    time::TuioTime,
    value_object::{Point, SessionId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SignalOptions {
    pub session_id: SessionId,
    pub component_id: u32,
    pub targets: Vec<SessionId>,
    pub time: TuioTime,
}

/// A signal emitted by one component towards a set of target sessions
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    component: Component,
    component_id: u32,
    targets: Vec<SessionId>,
}

impl Signal {
    pub fn new(options: SignalOptions) -> Self {
        Self {
            component: Component::new(options.session_id, options.time, Point::default(), 0.0),
            component_id: options.component_id,
            targets: options.targets,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub fn component_id(&self) -> u32 {
        self.component_id
    }

    pub fn targets(&self) -> &[SessionId] {
        &self.targets
    }

    pub fn update(
        &mut self,
        time: TuioTime,
        component_id: u32,
        targets: &[SessionId],
    ) -> Result<UpdateOutcome, TrackError> {
        self.component.validate(time)?;
        if self.component_id == component_id && self.targets == targets {
            return self.component.advance(time).map(|_| UpdateOutcome::Unchanged);
        }
        self.component_id = component_id;
        self.targets = targets.to_vec();
        self.component.touch(time)?;
        Ok(UpdateOutcome::Changed)
    }

    pub fn update_from(&mut self, other: &Signal) -> Result<UpdateOutcome, TrackError> {
        let time = self.component.time();
        self.update(time, other.component_id, &other.targets)
    }
}
