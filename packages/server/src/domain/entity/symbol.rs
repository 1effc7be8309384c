//! Symbolic marker content (`/tuio2/sym`).

use crate::domain::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    time::TuioTime,
    value_object::{Point, SessionId, encode_type_user_id},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOptions {
    pub session_id: SessionId,
    pub type_id: u16,
    pub user_id: u16,
    pub component_id: u32,
    /// Symbol family, e.g. `fidtrk/18` or `qr/url`
    pub group: String,
    pub data: String,
    pub time: TuioTime,
}

/// Reject text the OSC string encoding cannot carry
pub(crate) fn check_text(value: &str) -> Result<(), TrackError> {
    if value.contains('\0') {
        return Err(TrackError::NulInText(value.to_string()));
    }
    Ok(())
}

/// Decoded symbol content. Symbols carry no geometry of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    component: Component,
    type_id: u16,
    user_id: u16,
    component_id: u32,
    group: String,
    data: String,
}

impl Symbol {
    pub fn new(options: SymbolOptions) -> Self {
        Self {
            component: Component::new(options.session_id, options.time, Point::default(), 0.0),
            type_id: options.type_id,
            user_id: options.user_id,
            component_id: options.component_id,
            group: options.group,
            data: options.data,
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

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn update(
        &mut self,
        time: TuioTime,
        group: &str,
        data: &str,
    ) -> Result<UpdateOutcome, TrackError> {
        self.component.validate(time)?;
        check_text(group)?;
        check_text(data)?;
        if self.group == group && self.data == data {
            return self.component.advance(time).map(|_| UpdateOutcome::Unchanged);
        }
        self.group = group.to_string();
        self.data = data.to_string();
        self.component.touch(time)?;
        Ok(UpdateOutcome::Changed)
    }

    pub fn update_from(&mut self, other: &Symbol) -> Result<UpdateOutcome, TrackError> {
        let time = self.component.time();
        self.type_id = other.type_id;
        self.user_id = other.user_id;
        self.component_id = other.component_id;
        self.update(time, &other.group, &other.data)
    }
}
