//! Synchronous one-to-many notification.
//!
//! A [`Notifier`] holds an ordered list of reactions and calls every one of
//! them, inline, whenever a value is published. There is no subscription
//! handle and no removal: reactions live as long as the notifier does.
//!
//! # Re-entrancy
//!
//! Reactions are free to publish to other notifiers or to subscribe new
//! reactions (even to the notifier currently publishing). A publish walks a
//! snapshot of the list taken when it started, so a reaction added mid-walk
//! first runs on the *next* publish.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Reaction<T> = Rc<dyn Fn(&T)>;

pub struct Notifier<T> {
    reactions: RefCell<Vec<Reaction<T>>>,
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            reactions: RefCell::new(Vec::new()),
        }
    }

    /// Append `reaction` to the end of the list.
    pub fn subscribe(&self, reaction: impl Fn(&T) + 'static) {
        self.reactions.borrow_mut().push(Rc::new(reaction));
    }

    /// Invoke every reaction with `value`, in subscription order.
    pub fn publish(&self, value: &T) {
        // The borrow must end before any reaction runs.
        let snapshot: Vec<Reaction<T>> = self.reactions.borrow().clone();
        for reaction in snapshot {
            reaction(value);
        }
    }

    pub fn len(&self) -> usize {
        self.reactions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("reactions", &self.len())
            .finish()
    }
}
