//! Boolean signal lines.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::notifier::Notifier;

static NEXT_WIRE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a wire, stable across clones of its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireId(u64);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire#{}", self.0)
    }
}

struct WireInner {
    id: WireId,
    value: Cell<bool>,
    notifier: Notifier<bool>,
}

/// A single boolean signal line with change notification.
///
/// `Wire` is a shared handle: clones refer to the same line. Wires start low
/// (`false`).
///
/// # Invariants
///
/// 1. Reactions fire only when [`set`](Wire::set) actually changes the value.
/// 2. [`on_update`](Wire::on_update) calls the new reaction once with the
///    current value before registering it.
#[derive(Clone)]
pub struct Wire {
    inner: Rc<WireInner>,
}

impl Wire {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(WireInner {
                id: WireId(NEXT_WIRE_ID.fetch_add(1, Ordering::Relaxed)),
                value: Cell::new(false),
                notifier: Notifier::new(),
            }),
        }
    }

    pub fn id(&self) -> WireId {
        self.inner.id
    }

    pub fn value(&self) -> bool {
        self.inner.value.get()
    }

    /// Set the value of the wire, notifying reactions if it changed.
    pub fn set(&self, value: bool) {
        if value == self.inner.value.get() {
            return;
        }
        self.inner.value.set(value);
        self.inner.notifier.publish(&value);
    }

    /// Listen for changes to the value of this wire.
    ///
    /// `reaction` is also called once, right away, with the current value so
    /// that downstream components start out consistent with this wire.
    pub fn on_update(&self, reaction: impl Fn(bool) + 'static) {
        reaction(self.value());
        self.inner.notifier.subscribe(move |value: &bool| reaction(*value));
    }

    pub fn downgrade(&self) -> WeakWire {
        WeakWire(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Wire) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Wire {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wire")
            .field("id", &self.inner.id)
            .field("value", &self.value())
            .field("reactions", &self.inner.notifier.len())
            .finish()
    }
}

/// Non-owning wire handle, used by reactions so that feedback loops don't
/// keep each other alive.
#[derive(Clone, Debug)]
pub struct WeakWire(Weak<WireInner>);

impl WeakWire {
    pub fn upgrade(&self) -> Option<Wire> {
        self.0.upgrade().map(|inner| Wire { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(wire: &Wire) -> Rc<RefCell<Vec<bool>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        wire.on_update(move |v| sink.borrow_mut().push(v));
        seen
    }

    #[test]
    fn on_update_delivers_current_value_immediately() {
        let wire = Wire::new();
        wire.set(true);

        let seen = recorder(&wire);

        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn repeated_set_notifies_once() {
        let wire = Wire::new();
        let seen = recorder(&wire);

        wire.set(true);
        wire.set(true);

        // bootstrap + one change
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn setting_the_initial_value_is_silent() {
        let wire = Wire::new();
        let seen = recorder(&wire);

        wire.set(false);

        assert_eq!(*seen.borrow(), vec![false]);
    }

    #[test]
    fn reaction_observes_value_already_assigned() {
        let wire = Wire::new();
        let observed = Rc::new(RefCell::new(Vec::new()));
        {
            let handle = wire.clone();
            let observed = observed.clone();
            wire.on_update(move |_| observed.borrow_mut().push(handle.value()));
        }

        wire.set(true);
        wire.set(true);

        assert_eq!(*observed.borrow(), vec![false, true]);
    }

    #[test]
    fn clones_share_identity_and_value() {
        let wire = Wire::new();
        let other = wire.clone();
        other.set(true);

        assert!(wire.value());
        assert!(wire.ptr_eq(&other));
        assert_eq!(wire.id(), other.id());
        assert_ne!(wire.id(), Wire::new().id());
    }

    #[test]
    fn weak_handle_does_not_keep_wire_alive() {
        let wire = Wire::new();
        let weak = wire.downgrade();
        assert!(weak.upgrade().is_some());

        drop(wire);
        assert!(weak.upgrade().is_none());
    }
}
