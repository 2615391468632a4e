//! Deferred wire writes.
//!
//! Gates never set their output wire directly. They push an [`Event`] here,
//! and the circuit applies the whole queue at the next step boundary. Events
//! pushed while a generation is being applied land in the next generation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::wire::Wire;

/// A pending `(wire, value)` assignment.
#[derive(Debug, Clone)]
pub(crate) struct Event {
    wire: Wire,
    value: bool,
}

impl Event {
    pub(crate) fn apply(self) {
        self.wire.set(self.value);
    }
}

#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    events: Rc<RefCell<Vec<Event>>>,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Remove and return everything queued so far, leaving an empty queue in
    /// place for whatever the returned events trigger.
    pub(crate) fn take_generation(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub(crate) fn sender(&self) -> EventSender {
        EventSender(Rc::downgrade(&self.events))
    }
}

/// Enqueue side of an [`EventQueue`], held by gate reactions.
///
/// Weak, since queued events hold the wires whose reactions hold this.
#[derive(Debug, Clone)]
pub(crate) struct EventSender(Weak<RefCell<Vec<Event>>>);

impl EventSender {
    pub(crate) fn send(&self, wire: Wire, value: bool) {
        if let Some(events) = self.0.upgrade() {
            events.borrow_mut().push(Event { wire, value });
        }
    }
}
