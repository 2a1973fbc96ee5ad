#![forbid(unsafe_code)]

//! Reference modules for exercising bindings.
//!
//! - [`RecordingModule`]: records every change map together with the props it
//!   observed when its hook ran.
//! - [`MisconfiguredModule`]: declares a change hook slot holding a string,
//!   which a binding must reject.

use newton::{ChangeHook, ChangeMap, Module, ModuleBase, OnChange, Props, Unsubscribe};

/// One call to [`RecordingModule`]'s change hook.
#[derive(Debug)]
pub struct ChangeRecord<V, I> {
    /// Change map passed to the hook.
    pub changes: ChangeMap<V>,
    /// The module's props at the moment the hook ran.
    pub props: Props<V, I>,
}

/// Module that keeps a log of its change notifications.
#[derive(Debug)]
pub struct RecordingModule<V, I> {
    base: ModuleBase<V, I>,
    initial_props: Props<V, I>,
    records: Vec<ChangeRecord<V, I>>,
    set_props_calls: usize,
}

impl<V: Clone, I> RecordingModule<V, I> {
    /// Props the module was built with.
    #[must_use]
    pub fn initial_props(&self) -> &Props<V, I> {
        &self.initial_props
    }

    /// Every change notification, oldest first.
    #[must_use]
    pub fn records(&self) -> &[ChangeRecord<V, I>] {
        &self.records
    }

    /// Number of times the hook ran.
    #[must_use]
    pub fn change_calls(&self) -> usize {
        self.records.len()
    }

    /// The most recent change map.
    #[must_use]
    pub fn last_changes(&self) -> Option<&ChangeMap<V>> {
        self.records.last().map(|r| &r.changes)
    }

    /// Number of times props were replaced.
    #[must_use]
    pub fn set_props_calls(&self) -> usize {
        self.set_props_calls
    }

    /// The injected unsubscribe handle.
    #[must_use]
    pub fn unsubscribe_handle(&self) -> &Unsubscribe {
        self.base.unsubscribe_handle()
    }

    /// End this module's own subscription.
    pub fn unsubscribe(&self) {
        self.base.unsubscribe();
    }
}

impl<V: Clone + Eq, I> Module for RecordingModule<V, I> {
    type Value = V;
    type Input = I;

    fn from_props(props: Props<V, I>) -> Self {
        Self {
            initial_props: props.clone(),
            base: ModuleBase::new(props),
            records: Vec::new(),
            set_props_calls: 0,
        }
    }

    fn props(&self) -> &Props<V, I> {
        self.base.props()
    }

    fn set_props(&mut self, props: Props<V, I>) {
        self.set_props_calls += 1;
        self.base.set_props(props);
    }

    fn change_hook(&mut self) -> ChangeHook<'_, V> {
        ChangeHook::Callable(self)
    }

    fn set_unsubscribe(&mut self, unsubscribe: Unsubscribe) {
        self.base.set_unsubscribe(unsubscribe);
    }
}

impl<V: Clone, I> OnChange<V> for RecordingModule<V, I> {
    fn on_change(&mut self, changes: &ChangeMap<V>) {
        self.records.push(ChangeRecord {
            changes: changes.clone(),
            props: self.base.props().clone(),
        });
    }
}

/// Module whose `on_change` slot holds a string instead of a function.
#[derive(Debug)]
pub struct MisconfiguredModule<V, I> {
    base: ModuleBase<V, I>,
    on_change: &'static str,
}

impl<V, I> MisconfiguredModule<V, I> {
    /// The value sitting in the hook slot.
    #[must_use]
    pub fn on_change_value(&self) -> &'static str {
        self.on_change
    }
}

impl<V: Clone + Eq, I> Module for MisconfiguredModule<V, I> {
    type Value = V;
    type Input = I;

    fn from_props(props: Props<V, I>) -> Self {
        Self {
            base: ModuleBase::new(props),
            on_change: "not a function",
        }
    }

    fn props(&self) -> &Props<V, I> {
        self.base.props()
    }

    fn set_props(&mut self, props: Props<V, I>) {
        self.base.set_props(props);
    }

    fn change_hook(&mut self) -> ChangeHook<'_, V> {
        ChangeHook::NotCallable { found: "string" }
    }
}
