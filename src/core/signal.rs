//! Publish/Subscribe Registries
//!
//! A [`Signal`] owns a set of boxed callbacks keyed by [`Connection`]. The
//! owner of the signal decides when to emit; subscribers decide when to
//! leave by handing their connection back to [`Signal::disconnect`].
//!
//! The callback type is a parameter so that one registry type covers both
//! plain id notifications (`dyn FnMut(Id)`) and instance hooks that may fail
//! (`dyn FnMut(&mut T, Id) -> Result<()>`).

use slotmap::{SlotMap, new_key_type};

use crate::errors::Result;

new_key_type! {
    /// Subscription handle returned by [`Signal::connect`].
    pub struct Connection;
}

/// Callback registry for one event kind.
pub struct Signal<F: ?Sized> {
    slots: SlotMap<Connection, Box<F>>,
}

impl<F: ?Sized> Signal<F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Registers an already boxed callback.
    pub fn connect_boxed(&mut self, callback: Box<F>) -> Connection {
        self.slots.insert(callback)
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        self.slots.remove(connection).is_some()
    }

    #[must_use]
    pub fn is_connected(&self, connection: Connection) -> bool {
        self.slots.contains_key(connection)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn callbacks_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.slots.values_mut()
    }
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for Signal<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.slots.len())
            .finish()
    }
}

// ============================================================================
// Plain notifications
// ============================================================================

impl<A: Copy + 'static> Signal<dyn FnMut(A)> {
    pub fn connect(&mut self, callback: impl FnMut(A) + 'static) -> Connection {
        self.connect_boxed(Box::new(callback))
    }

    /// Calls every subscriber with `arg`.
    pub fn emit(&mut self, arg: A) {
        for callback in self.callbacks_mut() {
            callback(arg);
        }
    }
}

// ============================================================================
// Instance hooks
// ============================================================================

/// Hook signature fired with the freshly stored instance and its id.
pub type InstanceHook<T, I> = dyn FnMut(&mut T, I) -> Result<()>;

impl<T: 'static, I: Copy + 'static> Signal<InstanceHook<T, I>> {
    pub fn connect(
        &mut self,
        callback: impl FnMut(&mut T, I) -> Result<()> + 'static,
    ) -> Connection {
        self.connect_boxed(Box::new(callback))
    }

    /// Runs every hook; stops at the first failure and returns it.
    pub fn emit(&mut self, instance: &mut T, id: I) -> Result<()> {
        for callback in self.callbacks_mut() {
            callback(instance, id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_all_subscribers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal: Signal<dyn FnMut(u32)> = Signal::new();

        let a = Rc::clone(&seen);
        signal.connect(move |v| a.borrow_mut().push(("a", v)));
        let b = Rc::clone(&seen);
        signal.connect(move |v| b.borrow_mut().push(("b", v)));

        signal.emit(3);
        assert_eq!(&*seen.borrow(), &[("a", 3), ("b", 3)]);
    }

    #[test]
    fn disconnect_is_deterministic() {
        let count = Rc::new(RefCell::new(0));
        let mut signal: Signal<dyn FnMut(u32)> = Signal::new();

        let c = Rc::clone(&count);
        let conn = signal.connect(move |_| *c.borrow_mut() += 1);

        signal.emit(1);
        assert!(signal.disconnect(conn));
        assert!(!signal.disconnect(conn));
        signal.emit(2);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn instance_hooks_stop_at_first_error() {
        let mut signal: Signal<InstanceHook<String, u32>> = Signal::new();
        signal.connect(|s: &mut String, id| {
            s.push_str(&id.to_string());
            Ok(())
        });
        signal.connect(|_: &mut String, _| {
            Err(crate::errors::EngineError::InvalidOperation("nope".into()))
        });

        let mut value = String::new();
        assert!(signal.emit(&mut value, 9).is_err());
        assert_eq!(value, "9");
    }
}
