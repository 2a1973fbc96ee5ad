#![forbid(unsafe_code)]

//! Connect a [`Module`] to a [`Store`].
//!
//! A [`ConnectedBinding`] owns the module, the last projected state, the
//! bound actions, and the store subscription. On every store notification it
//! re-projects the state, diffs it field by field against the previous
//! projection, and, only when some field changed, hands the module new props
//! followed by a [`ChangeMap`].
//!
//! # Usage
//!
//! ```ignore
//! let connector = connect(
//!     |s: &AppState| ProjectedState::new().with("todos", s.todos.clone()),
//!     |d: &Dispatch<Action>| BoundActions::new().with("add", d.bind(Action::Add)),
//! );
//! let binding = connector.bind::<TodosManager, _>(&store);
//! store.dispatch(Action::Add("dishes".into()))?; // TodosManager::on_change fires
//! binding.unsubscribe();
//! ```
//!
//! # Invariants
//!
//! 1. The module's props are replaced, and its change hook called, at most
//!    once per store notification and only when at least one projected field
//!    is unequal to its previous value.
//! 2. The change map's keys are exactly the keys of the latest projection.
//! 3. Projected state and change map are replaced together; a notification
//!    without changes leaves both untouched.
//! 4. Bound actions are computed once, at construction.
//! 5. At most one subscription is live. After `unsubscribe()` no notification
//!    reaches the module, even if the store still holds the listener.
//! 6. Props are set before the change hook runs.
//! 7. Projection state and the module live in separate cells. The projection
//!    is committed before the module is touched, so `props()`,
//!    `current_state()` and `change_map()` can be read while the hook runs.
//!
//! # Re-entrancy
//!
//! A module that dispatches from its change hook re-enters the store while
//! the binding is busy. Such notifications are queued and each one is handled
//! right after the current propagation returns. A module that dispatches on
//! every change loops forever; avoiding that is the caller's job.
//!
//! # Failure Modes
//!
//! - Projection or module constructor panics: propagate to the caller; no
//!   binding is created.
//! - Non-callable change hook: [`ConnectError::Configuration`] is returned
//!   from `handle_change()` and from the `dispatch()` that triggered it. The
//!   props have already been replaced at that point.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, debug_span, error, trace};

use crate::change::ChangeMap;
use crate::config::{ConnectConfig, ResubscribePolicy};
use crate::error::{ConnectError, Result};
use crate::module::{ChangeHook, Module, Unsubscribe};
use crate::projection::{Projector, StateProjector};
use crate::props::{BoundActions, ProjectedState, Props};
use crate::store::{Dispatch, Listener, Store, UnsubscribeFn};

// ---------------------------------------------------------------------------
// SubscriptionSlot — the one live store subscription
// ---------------------------------------------------------------------------

/// Holder for the store's unsubscribe callback.
///
/// `generation` increments on every subscribe, so a listener left behind in
/// the store by an earlier subscription can tell it is stale.
pub(crate) struct SubscriptionSlot {
    handle: Option<UnsubscribeFn>,
    generation: u64,
    label: String,
}

impl SubscriptionSlot {
    fn new(label: String) -> Self {
        Self {
            handle: None,
            generation: 0,
            label,
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }

    /// Invoke and clear the store callback. Returns whether anything was
    /// released.
    pub(crate) fn release(slot: &RefCell<Self>) -> bool {
        let (handle, label) = {
            let mut slot = slot.borrow_mut();
            (slot.handle.take(), slot.label.clone())
        };
        match handle {
            Some(unsubscribe) => {
                unsubscribe();
                debug!(binding = %label, "unsubscribed from store");
                true
            }
            None => {
                trace!(binding = %label, "unsubscribe while not subscribed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Projection — state read by accessors
// ---------------------------------------------------------------------------

struct Projection<V, I> {
    current_state: ProjectedState<V>,
    change_map: ChangeMap<V>,
    action_dispatchers: BoundActions<I>,
}

impl<V: Clone, I> Projection<V, I> {
    fn props(&self) -> Props<V, I> {
        Props::merge(&self.action_dispatchers, &self.current_state)
    }
}

/// Clears the busy flag when propagation ends, including by unwinding.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// Shared — everything a store listener reaches
// ---------------------------------------------------------------------------

struct Shared<S, P, M>
where
    S: Store,
    P: StateProjector<S::State, S::Action>,
{
    store: Rc<S>,
    projector: P,
    projection: RefCell<Projection<P::Value, P::Input>>,
    instance: RefCell<M>,
    label: String,
    busy: Cell<bool>,
    pending: Cell<usize>,
}

impl<S, P, M> Shared<S, P, M>
where
    S: Store,
    P: StateProjector<S::State, S::Action>,
    M: Module<Value = P::Value, Input = P::Input>,
{
    /// Diff, commit, then propagate. Never holds the projection borrow while
    /// the module runs.
    fn handle_change(&self) -> Result<bool> {
        let _span = debug_span!("connect.handle_change", binding = %self.label).entered();

        let new_state = self.projector.project_state(&self.store.get_state());
        let (props, change_map) = {
            let mut projection = self.projection.borrow_mut();
            let change_map = ChangeMap::diff(&projection.current_state, &new_state);
            if !change_map.any_changed() {
                trace!("no projected field changed");
                return Ok(false);
            }
            projection.current_state = new_state;
            projection.change_map = change_map.clone();
            (projection.props(), change_map)
        };

        self.set_module_props(props, &change_map)?;
        Ok(true)
    }

    fn set_module_props(
        &self,
        props: Props<P::Value, P::Input>,
        change_map: &ChangeMap<P::Value>,
    ) -> Result<()> {
        let mut instance = self.instance.borrow_mut();
        instance.set_props(props);
        debug!(
            changed = change_map.changed_keys().count(),
            fields = change_map.len(),
            "propagated props to module"
        );

        match instance.change_hook() {
            ChangeHook::Absent => Ok(()),
            ChangeHook::Callable(hook) => {
                hook.on_change(change_map);
                Ok(())
            }
            ChangeHook::NotCallable { found } => {
                error!(found, "module on_change is not callable");
                Err(ConnectError::configuration(found))
            }
        }
    }

    /// Run one notification, then any that arrived while it ran.
    ///
    /// Called while already propagating, the notification is queued and
    /// `Ok(false)` is returned.
    fn deliver(&self, slot: &RefCell<SubscriptionSlot>) -> Result<bool> {
        if self.busy.get() {
            self.pending.set(self.pending.get() + 1);
            trace!(queued = self.pending.get(), "notification during propagation; queued");
            return Ok(false);
        }

        let _busy = BusyGuard::enter(&self.busy);
        let result = (|| -> Result<bool> {
            let mut changed = self.handle_change()?;
            while self.pending.get() > 0 {
                self.pending.set(self.pending.get() - 1);
                if !slot.borrow().is_subscribed() {
                    break;
                }
                changed |= self.handle_change()?;
            }
            Ok(changed)
        })();
        self.pending.set(0);
        result
    }
}

// ---------------------------------------------------------------------------
// ConnectedBinding
// ---------------------------------------------------------------------------

/// A module subscribed to a store through a [`StateProjector`].
///
/// Dropping the binding unsubscribes it.
pub struct ConnectedBinding<S, P, M>
where
    S: Store + 'static,
    P: StateProjector<S::State, S::Action> + 'static,
    M: Module<Value = P::Value, Input = P::Input> + 'static,
{
    shared: Rc<Shared<S, P, M>>,
    slot: Rc<RefCell<SubscriptionSlot>>,
    config: ConnectConfig,
}

impl<S, P, M> ConnectedBinding<S, P, M>
where
    S: Store + 'static,
    S::Action: 'static,
    P: StateProjector<S::State, S::Action> + 'static,
    M: Module<Value = P::Value, Input = P::Input> + 'static,
{
    /// Project, build the module, and subscribe, with default settings.
    pub fn new(store: Rc<S>, projector: P) -> Self {
        Self::with_config(store, projector, ConnectConfig::default())
    }

    /// Project, build the module, and subscribe.
    ///
    /// The module must not dispatch from its constructor: the subscription
    /// does not exist yet.
    pub fn with_config(store: Rc<S>, projector: P, config: ConnectConfig) -> Self {
        let label = config.label_or(short_type_name::<M>());

        let current_state = projector.project_state(&store.get_state());
        let action_dispatchers = projector.bind_actions(&Dispatch::from_store(&store));
        let instance = M::from_props(Props::merge(&action_dispatchers, &current_state));

        let binding = Self {
            shared: Rc::new(Shared {
                store,
                projector,
                projection: RefCell::new(Projection {
                    current_state,
                    change_map: ChangeMap::new(),
                    action_dispatchers,
                }),
                instance: RefCell::new(instance),
                label: label.clone(),
                busy: Cell::new(false),
                pending: Cell::new(0),
            }),
            slot: Rc::new(RefCell::new(SubscriptionSlot::new(label))),
            config,
        };
        binding.attach();
        binding
    }

    /// Subscribe to the store.
    ///
    /// While already subscribed, behaves per [`ResubscribePolicy`].
    ///
    /// # Errors
    ///
    /// [`ConnectError::AlreadySubscribed`] under [`ResubscribePolicy::Reject`].
    pub fn subscribe(&self) -> Result<()> {
        if self.is_subscribed() {
            match self.config.resubscribe {
                ResubscribePolicy::Ignore => {
                    debug!(binding = %self.label(), "already subscribed; ignoring");
                    return Ok(());
                }
                ResubscribePolicy::Reject => {
                    return Err(ConnectError::AlreadySubscribed {
                        binding: self.label().to_string(),
                    });
                }
                ResubscribePolicy::Replace => {
                    SubscriptionSlot::release(&self.slot);
                }
            }
        }
        self.attach();
        Ok(())
    }

    fn attach(&self) {
        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.generation += 1;
            slot.generation
        };
        let handle = self.shared.store.subscribe(self.listener(generation));
        self.slot.borrow_mut().handle = Some(handle);
        self.shared
            .instance
            .borrow_mut()
            .set_unsubscribe(Unsubscribe::attached(&self.slot));
        debug!(binding = %self.label(), generation, "subscribed to store");
    }

    fn listener(&self, generation: u64) -> Listener {
        let shared = Rc::downgrade(&self.shared);
        let slot = Rc::downgrade(&self.slot);
        Rc::new(move || -> Result<()> {
            let (Some(shared), Some(slot)) = (shared.upgrade(), slot.upgrade()) else {
                return Ok(());
            };
            if !slot.borrow().is_live(generation) {
                trace!(generation, "stale listener ignored");
                return Ok(());
            }
            shared.deliver(&slot).map(|_| ())
        })
    }

    /// Stop receiving notifications. A no-op when not subscribed.
    pub fn unsubscribe(&self) {
        SubscriptionSlot::release(&self.slot);
    }

    /// Whether a subscription is live.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.slot.borrow().is_subscribed()
    }

    /// Re-project and propagate if any field changed.
    ///
    /// Returns whether the module was updated. Normally driven by the store.
    /// Called during propagation, the update is queued behind the current
    /// one and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Configuration`] if the module's change hook is not
    /// callable.
    pub fn handle_change(&self) -> Result<bool> {
        self.shared.deliver(&self.slot)
    }

    /// Bound actions overlaid by the current projected state.
    #[must_use]
    pub fn props(&self) -> Props<P::Value, P::Input> {
        self.shared.projection.borrow().props()
    }

    /// Last projected state.
    #[must_use]
    pub fn current_state(&self) -> ProjectedState<P::Value> {
        self.shared.projection.borrow().current_state.clone()
    }

    /// Change map of the last propagated update; empty before the first.
    #[must_use]
    pub fn change_map(&self) -> ChangeMap<P::Value> {
        self.shared.projection.borrow().change_map.clone()
    }

    /// The bound actions computed at construction.
    #[must_use]
    pub fn action_dispatchers(&self) -> BoundActions<P::Input> {
        self.shared.projection.borrow().action_dispatchers.clone()
    }

    /// Inspect the wrapped module.
    ///
    /// # Panics
    ///
    /// Panics if called while the module itself is running, i.e. from its
    /// change hook or from a store listener notified by a dispatch the hook
    /// made. Use [`props`](Self::props) there instead.
    pub fn with_instance<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.shared.instance.borrow())
    }

    /// Label used in log fields.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Settings this binding was built with.
    #[must_use]
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }
}

impl<S, P, M> Drop for ConnectedBinding<S, P, M>
where
    S: Store + 'static,
    P: StateProjector<S::State, S::Action> + 'static,
    M: Module<Value = P::Value, Input = P::Input> + 'static,
{
    fn drop(&mut self) {
        SubscriptionSlot::release(&self.slot);
    }
}

impl<S, P, M> fmt::Debug for ConnectedBinding<S, P, M>
where
    S: Store + 'static,
    P: StateProjector<S::State, S::Action> + 'static,
    M: Module<Value = P::Value, Input = P::Input> + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("ConnectedBinding")
            .field("label", &self.shared.label)
            .field("subscribed", &slot.handle.is_some())
            .field("generation", &slot.generation)
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ---------------------------------------------------------------------------
// Connector — reusable projector + config
// ---------------------------------------------------------------------------

/// A projector waiting to be bound to a module type and a store.
#[derive(Clone, Debug)]
pub struct Connector<P> {
    projector: P,
    config: ConnectConfig,
}

/// Pair a state projection with a dispatch projection.
///
/// Pass [`whole_state`](crate::whole_state) and
/// [`raw_dispatch`](crate::raw_dispatch) for the defaults.
pub fn connect<F, G>(map_state: F, map_dispatch: G) -> Connector<Projector<F, G>> {
    Connector::from_projector(Projector::new(map_state, map_dispatch))
}

impl<P> Connector<P> {
    /// Wrap an existing projector.
    pub fn from_projector(projector: P) -> Self {
        Self {
            projector,
            config: ConnectConfig::default(),
        }
    }

    /// Use `config` for bindings created from here on.
    #[must_use]
    pub fn with_config(mut self, config: ConnectConfig) -> Self {
        self.config = config;
        self
    }

    /// Build module `M` from `store` and subscribe it.
    pub fn bind<M, S>(&self, store: &Rc<S>) -> ConnectedBinding<S, P, M>
    where
        S: Store + 'static,
        S::Action: 'static,
        P: StateProjector<S::State, S::Action> + Clone + 'static,
        M: Module<Value = P::Value, Input = P::Input> + 'static,
    {
        ConnectedBinding::with_config(
            Rc::clone(store),
            self.projector.clone(),
            self.config.clone(),
        )
    }
}
