#![forbid(unsafe_code)]

//! Reducer-backed in-memory store.
//!
//! [`MemoryStore`] behaves like a minimal Redux store: `dispatch` runs the
//! reducer, then notifies every listener registered at that moment. The
//! listener list is snapshotted before notification, so a listener removed
//! mid-round is still called in that round and a listener added mid-round is
//! not called until the next one.
//!
//! Test-only helpers [`MemoryStore::replace_state`] and
//! [`MemoryStore::notify`] split the two halves of `dispatch` so tests can
//! drive a binding by hand.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use newton::{Listener, Result, Store, UnsubscribeFn};

type Reducer<St, A> = Box<dyn Fn(&St, A) -> St>;

/// In-memory store driven by a reducer.
pub struct MemoryStore<St, A> {
    state: RefCell<St>,
    reducer: Reducer<St, A>,
    listeners: Rc<RefCell<Vec<(u64, Listener)>>>,
    next_id: Cell<u64>,
    subscribe_calls: Cell<usize>,
    unsubscribe_calls: Rc<Cell<usize>>,
    dispatch_calls: Cell<usize>,
}

impl<St: fmt::Debug, A> fmt::Debug for MemoryStore<St, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &self.state.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<St: Clone + 'static, A: 'static> MemoryStore<St, A> {
    /// Create a store holding `initial`, updated by `reducer`.
    pub fn new(initial: St, reducer: impl Fn(&St, A) -> St + 'static) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(initial),
            reducer: Box::new(reducer),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
            subscribe_calls: Cell::new(0),
            unsubscribe_calls: Rc::new(Cell::new(0)),
            dispatch_calls: Cell::new(0),
        })
    }

    /// Overwrite the state without notifying listeners.
    pub fn replace_state(&self, state: St) {
        *self.state.borrow_mut() = state;
    }

    /// Notify every listener without changing the state.
    ///
    /// # Errors
    ///
    /// Returns the first listener error; later listeners are not called.
    pub fn notify(&self) -> Result<()> {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener()?;
        }
        Ok(())
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of `subscribe` calls so far.
    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.get()
    }

    /// Number of returned unsubscribe callbacks invoked so far.
    #[must_use]
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.get()
    }

    /// Number of `dispatch` calls so far.
    #[must_use]
    pub fn dispatch_calls(&self) -> usize {
        self.dispatch_calls.get()
    }
}

impl<St: Clone + 'static, A: 'static> Store for MemoryStore<St, A> {
    type State = St;
    type Action = A;

    fn get_state(&self) -> St {
        self.state.borrow().clone()
    }

    fn subscribe(&self, listener: Listener) -> UnsubscribeFn {
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners = Rc::clone(&self.listeners);
        let calls = Rc::clone(&self.unsubscribe_calls);
        Box::new(move || {
            calls.set(calls.get() + 1);
            listeners.borrow_mut().retain(|(lid, _)| *lid != id);
        })
    }

    fn dispatch(&self, action: A) -> Result<()> {
        self.dispatch_calls.set(self.dispatch_calls.get() + 1);
        let next = (self.reducer)(&*self.state.borrow(), action);
        *self.state.borrow_mut() = next;
        tracing::trace!(
            listeners = self.listeners.borrow().len(),
            "memory store dispatched"
        );
        self.notify()
    }
}
