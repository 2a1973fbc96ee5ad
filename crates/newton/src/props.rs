#![forbid(unsafe_code)]

//! Projected state, bound actions, and the merged props a module sees.
//!
//! # Merge order
//!
//! [`Props::merge`] lays down the bound actions first and overlays the
//! projected state on top, so a state field shadows an action with the same
//! key. Keys should not collide in practice; when they do, the state wins.
//!
//! # Equality
//!
//! State fields compare structurally; projected values are `Eq` wherever a
//! change map is built. Bound actions
//! compare by identity: two props are equal only if they carry the very same
//! bound function, the way the store's dispatch bindings are shared.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

// ---------------------------------------------------------------------------
// ProjectedState<V>
// ---------------------------------------------------------------------------

/// Derived fields produced by a state projection.
///
/// Keys iterate in sorted order, which keeps change maps deterministic.
#[derive(Clone, PartialEq)]
pub struct ProjectedState<V> {
    fields: BTreeMap<String, V>,
}

impl<V> Default for ProjectedState<V> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ProjectedState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<V> ProjectedState<V> {
    /// Create an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: V) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.fields.insert(key.into(), value)
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.fields.get(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.fields.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ProjectedState<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, V, const N: usize> From<[(K, V); N]> for ProjectedState<V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, V> IntoIterator for &'a ProjectedState<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// ---------------------------------------------------------------------------
// BoundAction<I> / BoundActions<I>
// ---------------------------------------------------------------------------

/// A dispatch-bound function exposed to the module as a prop.
pub struct BoundAction<I> {
    call: Rc<dyn Fn(I) -> Result<()>>,
}

impl<I> Clone for BoundAction<I> {
    fn clone(&self) -> Self {
        Self {
            call: Rc::clone(&self.call),
        }
    }
}

impl<I> PartialEq for BoundAction<I> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl<I> fmt::Debug for BoundAction<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoundAction(..)")
    }
}

impl<I> BoundAction<I> {
    /// Wrap a function as a bound action.
    pub fn new(call: impl Fn(I) -> Result<()> + 'static) -> Self {
        Self {
            call: Rc::new(call),
        }
    }

    /// Invoke the action.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by store listeners while the resulting
    /// action is dispatched.
    pub fn call(&self, input: I) -> Result<()> {
        (self.call)(input)
    }
}

/// Named bound actions produced once by the dispatch projection.
pub struct BoundActions<I> {
    actions: BTreeMap<String, BoundAction<I>>,
}

impl<I> Clone for BoundActions<I> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}

impl<I> PartialEq for BoundActions<I> {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}

impl<I> fmt::Debug for BoundActions<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

impl<I> Default for BoundActions<I> {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }
}

impl<I> BoundActions<I> {
    /// Create an empty action set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, action: BoundAction<I>) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    /// Insert or replace an action.
    pub fn insert(&mut self, name: impl Into<String>, action: BoundAction<I>) {
        self.actions.insert(name.into(), action);
    }

    /// Look up an action.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundAction<I>> {
        self.actions.get(name)
    }

    /// Action names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there are no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<K: Into<String>, I> FromIterator<(K, BoundAction<I>)> for BoundActions<I> {
    fn from_iter<T: IntoIterator<Item = (K, BoundAction<I>)>>(iter: T) -> Self {
        Self {
            actions: iter.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prop<V, I> / Props<V, I>
// ---------------------------------------------------------------------------

/// One entry of a module's props.
pub enum Prop<V, I> {
    /// A projected state field.
    Field(V),
    /// A bound action.
    Action(BoundAction<I>),
}

impl<V: Clone, I> Clone for Prop<V, I> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(value) => Self::Field(value.clone()),
            Self::Action(action) => Self::Action(action.clone()),
        }
    }
}

impl<V: PartialEq, I> PartialEq for Prop<V, I> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Field(a), Self::Field(b)) => a == b,
            (Self::Action(a), Self::Action(b)) => a == b,
            _ => false,
        }
    }
}

impl<V: fmt::Debug, I> fmt::Debug for Prop<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(value) => f.debug_tuple("Field").field(value).finish(),
            Self::Action(action) => action.fmt(f),
        }
    }
}

impl<V, I> Prop<V, I> {
    /// The state value, if this is a field.
    #[must_use]
    pub fn as_field(&self) -> Option<&V> {
        match self {
            Self::Field(value) => Some(value),
            Self::Action(_) => None,
        }
    }

    /// The bound action, if this is an action.
    #[must_use]
    pub fn as_action(&self) -> Option<&BoundAction<I>> {
        match self {
            Self::Field(_) => None,
            Self::Action(action) => Some(action),
        }
    }
}

/// Flattened view handed to a module: bound actions overlaid by state fields.
pub struct Props<V, I> {
    entries: BTreeMap<String, Prop<V, I>>,
}

impl<V, I> Default for Props<V, I> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V: Clone, I> Clone for Props<V, I> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: PartialEq, I> PartialEq for Props<V, I> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: fmt::Debug, I> fmt::Debug for Props<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<V: Clone, I> Props<V, I> {
    /// Merge `actions` and `state`; state fields win on key collision.
    #[must_use]
    pub fn merge(actions: &BoundActions<I>, state: &ProjectedState<V>) -> Self {
        let mut entries: BTreeMap<String, Prop<V, I>> = actions
            .actions
            .iter()
            .map(|(name, action)| (name.clone(), Prop::Action(action.clone())))
            .collect();
        for (key, value) in state {
            entries.insert(key.clone(), Prop::Field(value.clone()));
        }
        Self { entries }
    }
}

impl<V, I> Props<V, I> {
    /// Empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Prop<V, I>> {
        self.entries.get(key)
    }

    /// Look up a state field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(Prop::as_field)
    }

    /// Look up a bound action.
    #[must_use]
    pub fn action(&self, key: &str) -> Option<&BoundAction<I>> {
        self.entries.get(key).and_then(Prop::as_action)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entry names in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(name, prop)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Prop<V, I>> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> BoundAction<()> {
        BoundAction::new(|()| Ok(()))
    }

    #[test]
    fn projected_state_builder_and_lookup() {
        let state = ProjectedState::new().with("womp", 1).with("diggity", 2);
        assert_eq!(state.get("womp"), Some(&1));
        assert_eq!(state.len(), 2);
        assert!(!state.contains_key("missing"));
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["diggity", "womp"]);
    }

    #[test]
    fn projected_state_from_array() {
        let state = ProjectedState::from([("a", "x"), ("b", "y")]);
        assert_eq!(state.get("b"), Some(&"y"));
    }

    #[test]
    fn merge_state_wins_on_collision() {
        let actions = BoundActions::new().with("shared", noop()).with("only_action", noop());
        let state = ProjectedState::new().with("shared", 10).with("only_state", 20);
        let props = Props::merge(&actions, &state);

        assert_eq!(props.len(), 3);
        assert_eq!(props.field("shared"), Some(&10));
        assert!(props.action("shared").is_none());
        assert!(props.action("only_action").is_some());
        assert_eq!(props.field("only_state"), Some(&20));
    }

    #[test]
    fn bound_action_equality_is_identity() {
        let a = noop();
        let b = noop();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn props_equality_uses_action_identity() {
        let action = noop();
        let actions = BoundActions::new().with("go", action.clone());
        let state = ProjectedState::new().with("n", 1);

        let p1 = Props::merge(&actions, &state);
        let p2 = Props::merge(&BoundActions::new().with("go", action), &state);
        let p3 = Props::merge(&BoundActions::new().with("go", noop()), &state);

        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
    }

    #[test]
    fn props_debug_shows_fields() {
        let props: Props<i32, ()> =
            Props::merge(&BoundActions::new().with("go", noop()), &ProjectedState::from([("n", 3)]));
        let debug = format!("{props:?}");
        assert!(debug.contains("Field(3)"), "got: {debug}");
        assert!(debug.contains("BoundAction(..)"), "got: {debug}");
    }
}
