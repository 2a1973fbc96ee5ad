#![forbid(unsafe_code)]

//! The store contract a binding connects to.
//!
//! A [`Store`] is an external, single-threaded state container: a snapshot
//! read, a listener registry, and an action sink. The binding never mutates
//! the store directly; it only reads snapshots and forwards [`Dispatch`]
//! handles to the module through bound actions.
//!
//! # Invariants
//!
//! 1. `get_state()` is side-effect free.
//! 2. Every listener is invoked once per accepted action, after the state has
//!    been updated.
//! 3. `dispatch()` returns the first error raised by a listener, so failures
//!    inside a binding's change handling surface to whoever dispatched.
//! 4. Calling the [`UnsubscribeFn`] removes the listener before the next
//!    notification round.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::props::BoundAction;

/// Zero-argument change listener registered with a store.
pub type Listener = Rc<dyn Fn() -> Result<()>>;

/// Callback returned by [`Store::subscribe`] that removes the listener.
pub type UnsubscribeFn = Box<dyn FnOnce()>;

/// External mutable-state container.
pub trait Store {
    /// Snapshot type returned by [`get_state`](Self::get_state).
    type State;
    /// Action type accepted by [`dispatch`](Self::dispatch).
    type Action;

    /// Read the current state.
    fn get_state(&self) -> Self::State;

    /// Register `listener`; the returned callback unregisters it.
    fn subscribe(&self, listener: Listener) -> UnsubscribeFn;

    /// Submit an action and notify listeners synchronously.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a listener during notification.
    fn dispatch(&self, action: Self::Action) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Dispatch<A> — forwarding handle
// ---------------------------------------------------------------------------

/// Cloneable handle that forwards actions to a store's `dispatch`.
///
/// This is what the dispatch projection receives. It never inspects the
/// actions it forwards.
pub struct Dispatch<A> {
    forward: Rc<dyn Fn(A) -> Result<()>>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            forward: Rc::clone(&self.forward),
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

impl<A: 'static> Dispatch<A> {
    /// Wrap an arbitrary action sink.
    pub fn new(forward: impl Fn(A) -> Result<()> + 'static) -> Self {
        Self {
            forward: Rc::new(forward),
        }
    }

    /// Build a handle that forwards to `store.dispatch`.
    pub fn from_store<S>(store: &Rc<S>) -> Self
    where
        S: Store<Action = A> + 'static,
    {
        let store = Rc::clone(store);
        Self::new(move |action| store.dispatch(action))
    }

    /// Forward `action` to the store.
    ///
    /// # Errors
    ///
    /// Propagates whatever the store's listeners raised.
    pub fn dispatch(&self, action: A) -> Result<()> {
        (self.forward)(action)
    }

    /// Bind an action creator: the returned action builds an `A` from its
    /// input and dispatches it.
    pub fn bind<I: 'static>(&self, creator: impl Fn(I) -> A + 'static) -> BoundAction<I> {
        let forward = Rc::clone(&self.forward);
        BoundAction::new(move |input| forward(creator(input)))
    }

    /// Expose the raw dispatch as a bound action taking the action itself.
    #[must_use]
    pub fn to_action(&self) -> BoundAction<A> {
        let forward = Rc::clone(&self.forward);
        BoundAction::new(move |action| forward(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_dispatch() -> (Dispatch<u32>, Rc<RefCell<Vec<u32>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let dispatch = Dispatch::new(move |action| {
            sink.borrow_mut().push(action);
            Ok(())
        });
        (dispatch, seen)
    }

    #[test]
    fn dispatch_forwards_action() {
        let (dispatch, seen) = recording_dispatch();
        dispatch.dispatch(7).unwrap();
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn bind_applies_creator() {
        let (dispatch, seen) = recording_dispatch();
        let double = dispatch.bind(|n: u32| n * 2);
        double.call(21).unwrap();
        assert_eq!(*seen.borrow(), vec![42]);
    }

    #[test]
    fn clone_shares_sink() {
        let (dispatch, seen) = recording_dispatch();
        let other = dispatch.clone();
        dispatch.dispatch(1).unwrap();
        other.dispatch(2).unwrap();
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn to_action_forwards_raw() {
        let (dispatch, seen) = recording_dispatch();
        dispatch.to_action().call(5).unwrap();
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn dispatch_propagates_listener_error() {
        let dispatch: Dispatch<()> =
            Dispatch::new(|()| Err(crate::ConnectError::configuration("number")));
        let err = dispatch.dispatch(()).unwrap_err();
        assert!(err.is_configuration());
    }
}
