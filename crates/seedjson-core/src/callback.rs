//! The callback protocol between the parser and whatever consumes its events.
//!
//! The parser never builds a tree. Each structural transition is reported
//! immediately through one of six callbacks, so any consumer (the seed stack
//! machine, or the [`EventLog`] recorder) can be plugged in unchanged.
//!
//! Naming rules:
//! - a member whose value is an object/array is reported as
//!   `enter_object(Some(name))` / `enter_array(Some(name))`;
//! - array elements and the document root have no name (`None`);
//! - a scalar member is `visit_property(name, value)`, a scalar array element
//!   is `visit_array_element(value)`;
//! - a document whose root is a bare scalar is reported as a single
//!   `visit_array_element`.

use crate::error::Result;
use crate::token::Scalar;

/// Receiver of the six structural parse events. Any error aborts the parse.
pub trait ParseCallback {
    fn enter_object(&mut self, name: Option<&str>) -> Result<()>;
    fn leave_object(&mut self) -> Result<()>;
    fn enter_array(&mut self, name: Option<&str>) -> Result<()>;
    fn leave_array(&mut self) -> Result<()>;
    fn visit_property(&mut self, name: &str, value: Scalar) -> Result<()>;
    fn visit_array_element(&mut self, value: Scalar) -> Result<()>;
}

/// One recorded callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    EnterObject(Option<String>),
    LeaveObject,
    EnterArray(Option<String>),
    LeaveArray,
    Property(String, Scalar),
    Element(Scalar),
}

/// A callback consumer that records every event it receives, in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl ParseCallback for EventLog {
    fn enter_object(&mut self, name: Option<&str>) -> Result<()> {
        self.events.push(Event::EnterObject(name.map(str::to_string)));
        Ok(())
    }

    fn leave_object(&mut self) -> Result<()> {
        self.events.push(Event::LeaveObject);
        Ok(())
    }

    fn enter_array(&mut self, name: Option<&str>) -> Result<()> {
        self.events.push(Event::EnterArray(name.map(str::to_string)));
        Ok(())
    }

    fn leave_array(&mut self) -> Result<()> {
        self.events.push(Event::LeaveArray);
        Ok(())
    }

    fn visit_property(&mut self, name: &str, value: Scalar) -> Result<()> {
        self.events.push(Event::Property(name.to_string(), value));
        Ok(())
    }

    fn visit_array_element(&mut self, value: Scalar) -> Result<()> {
        self.events.push(Event::Element(value));
        Ok(())
    }
}
