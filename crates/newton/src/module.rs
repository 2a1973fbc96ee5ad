#![forbid(unsafe_code)]

//! The module side of a binding.
//!
//! A [`Module`] is a plain object the binding owns. It is built from the
//! initial props, receives new props wholesale on every propagated update,
//! and may opt into change notifications through [`ChangeHook`].
//!
//! # Change hook
//!
//! The hook is a capability, not a method every module must implement:
//!
//! - [`ChangeHook::Absent`]: the module has no hook; props are still set.
//! - [`ChangeHook::Callable`]: called with the [`ChangeMap`] after props are set.
//! - [`ChangeHook::NotCallable`]: the module declares a hook slot holding
//!   something that cannot be called. Propagation fails with
//!   [`ConnectError::Configuration`](crate::ConnectError::Configuration).
//!
//! # Unsubscribe
//!
//! Modules never see the store. Once subscribed, the binding injects an
//! [`Unsubscribe`] handle so a module can end its own subscription. Until then
//! the handle is detached: calling it logs an error and does nothing.
//!
//! # Hazards
//!
//! Do not dispatch from [`Module::from_props`]. The binding subscribes only
//! after the module exists, so such an action would never come back to it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{error, trace};

use crate::change::ChangeMap;
use crate::connect::SubscriptionSlot;
use crate::props::Props;

/// A module's optional change-notification capability.
pub trait OnChange<V> {
    /// Called after new props have been set, with the fields that changed.
    fn on_change(&mut self, changes: &ChangeMap<V>);
}

/// What a module exposes in its change-hook slot.
pub enum ChangeHook<'a, V> {
    /// No hook.
    Absent,
    /// A callable hook.
    Callable(&'a mut dyn OnChange<V>),
    /// A hook slot holding a value that cannot be called.
    NotCallable {
        /// Descriptive type of the value found.
        found: &'static str,
    },
}

impl<V> fmt::Debug for ChangeHook<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::NotCallable { found } => f
                .debug_struct("NotCallable")
                .field("found", found)
                .finish(),
        }
    }
}

/// A plain object wrapped by a [`ConnectedBinding`](crate::ConnectedBinding).
pub trait Module {
    /// Projected field type.
    type Value: Clone + Eq;
    /// Bound action input type.
    type Input;

    /// Build the module from its initial props.
    fn from_props(props: Props<Self::Value, Self::Input>) -> Self
    where
        Self: Sized;

    /// Current props.
    fn props(&self) -> &Props<Self::Value, Self::Input>;

    /// Replace the props wholesale.
    fn set_props(&mut self, props: Props<Self::Value, Self::Input>);

    /// Expose the change hook, if any.
    fn change_hook(&mut self) -> ChangeHook<'_, Self::Value> {
        ChangeHook::Absent
    }

    /// Receive the handle that ends this module's subscription.
    ///
    /// The default drops the handle: a module that does not override this
    /// cannot end its own subscription.
    fn set_unsubscribe(&mut self, _unsubscribe: Unsubscribe) {}
}

// ---------------------------------------------------------------------------
// Unsubscribe — narrow capability handed to modules
// ---------------------------------------------------------------------------

/// Handle that lets a module end its own subscription.
///
/// Holds only a weak reference to the binding's subscription slot, so a
/// module keeping it around neither keeps the binding alive nor sees the
/// store.
#[derive(Clone, Default)]
pub struct Unsubscribe {
    slot: Option<Weak<RefCell<SubscriptionSlot>>>,
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl Unsubscribe {
    /// A handle not connected to any binding.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    pub(crate) fn attached(slot: &Rc<RefCell<SubscriptionSlot>>) -> Self {
        Self {
            slot: Some(Rc::downgrade(slot)),
        }
    }

    /// Whether this handle was injected by a binding that still exists.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    /// End the subscription. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        match &self.slot {
            None => error!("cannot unsubscribe from the store before the module is connected"),
            Some(weak) => match weak.upgrade() {
                Some(slot) => {
                    SubscriptionSlot::release(&slot);
                }
                None => trace!("unsubscribe after binding dropped; nothing to do"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ModuleBase — reusable props holder
// ---------------------------------------------------------------------------

/// Props holder that modules can embed and delegate to.
///
/// Also usable directly as a [`Module`] without a change hook.
pub struct ModuleBase<V, I> {
    props: Props<V, I>,
    unsubscribe: Unsubscribe,
}

impl<V, I> Default for ModuleBase<V, I> {
    fn default() -> Self {
        Self {
            props: Props::new(),
            unsubscribe: Unsubscribe::detached(),
        }
    }
}

impl<V: fmt::Debug, I> fmt::Debug for ModuleBase<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBase")
            .field("props", &self.props)
            .field("unsubscribe", &self.unsubscribe)
            .finish()
    }
}

impl<V, I> ModuleBase<V, I> {
    /// Hold `props` with a detached unsubscribe handle.
    #[must_use]
    pub fn new(props: Props<V, I>) -> Self {
        Self {
            props,
            unsubscribe: Unsubscribe::detached(),
        }
    }

    /// Current props.
    #[must_use]
    pub fn props(&self) -> &Props<V, I> {
        &self.props
    }

    /// Replace the props wholesale.
    pub fn set_props(&mut self, props: Props<V, I>) {
        self.props = props;
    }

    /// Store the handle injected by the binding.
    pub fn set_unsubscribe(&mut self, unsubscribe: Unsubscribe) {
        self.unsubscribe = unsubscribe;
    }

    /// End this module's subscription.
    pub fn unsubscribe(&self) {
        self.unsubscribe.unsubscribe();
    }

    /// The unsubscribe handle.
    #[must_use]
    pub fn unsubscribe_handle(&self) -> &Unsubscribe {
        &self.unsubscribe
    }
}

impl<V: Clone + Eq, I> Module for ModuleBase<V, I> {
    type Value = V;
    type Input = I;

    fn from_props(props: Props<V, I>) -> Self {
        Self::new(props)
    }

    fn props(&self) -> &Props<V, I> {
        &self.props
    }

    fn set_props(&mut self, props: Props<V, I>) {
        self.props = props;
    }

    fn set_unsubscribe(&mut self, unsubscribe: Unsubscribe) {
        self.unsubscribe = unsubscribe;
    }
}
