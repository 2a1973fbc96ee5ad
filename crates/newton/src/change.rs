#![forbid(unsafe_code)]

//! Per-field change descriptors.
//!
//! A [`ChangeMap`] is built by comparing the previous projection with the new
//! one, field by field.
//!
//! # Invariants
//!
//! 1. The key set is exactly the key set of the *new* projection. Fields that
//!    disappeared are absent; fields that appeared are present and changed.
//! 2. `previous_value` is the field's value before the update, or `None` if
//!    the field did not exist.
//! 3. `has_changed` is `previous_value != Some(new_value)` under deep
//!    structural equality.
//!
//! # Equality
//!
//! Values must be `Eq`, so equality is reflexive and an unchanged field never
//! reads as changed. Raw floats are rejected because `NaN != NaN`; project
//! them through a total representation such as [`f64::to_bits`].
//!
//! ```compile_fail
//! use newton::{ChangeMap, ProjectedState};
//!
//! let ratio = ProjectedState::from([("ratio", f64::NAN)]);
//! let _ = ChangeMap::diff(&ratio, &ratio);
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::props::ProjectedState;

/// Whether one field changed, and what it held before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange<V> {
    /// The new value differs from the previous one.
    pub has_changed: bool,
    /// Value before this update; `None` when the field is new.
    pub previous_value: Option<V>,
}

impl<V> FieldChange<V> {
    /// A field whose value differs from `previous_value`.
    #[must_use]
    pub fn changed(previous_value: Option<V>) -> Self {
        Self {
            has_changed: true,
            previous_value,
        }
    }

    /// A field whose value equals `previous_value`.
    #[must_use]
    pub fn unchanged(previous_value: V) -> Self {
        Self {
            has_changed: false,
            previous_value: Some(previous_value),
        }
    }
}

/// Change descriptors keyed by projected field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMap<V> {
    entries: BTreeMap<String, FieldChange<V>>,
}

impl<V> Default for ChangeMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V: Clone + Eq> ChangeMap<V> {
    /// Compare `next` against `previous`, one entry per key of `next`.
    #[must_use]
    pub fn diff(previous: &ProjectedState<V>, next: &ProjectedState<V>) -> Self {
        let entries = next
            .iter()
            .map(|(key, value)| {
                let change = match previous.get(key) {
                    Some(prev) if prev == value => FieldChange::unchanged(prev.clone()),
                    prev => FieldChange::changed(prev.cloned()),
                };
                (key.clone(), change)
            })
            .collect();
        Self { entries }
    }
}

impl<V> ChangeMap<V> {
    /// Empty change map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field's descriptor.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldChange<V>> {
        self.entries.get(key)
    }

    /// Whether `key` is present and changed.
    #[must_use]
    pub fn has_changed(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|c| c.has_changed)
    }

    /// Whether at least one field changed.
    #[must_use]
    pub fn any_changed(&self) -> bool {
        self.entries.values().any(|c| c.has_changed)
    }

    /// Names of the fields that changed, in iteration order.
    pub fn changed_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, c)| c.has_changed)
            .map(|(k, _)| k.as_str())
    }

    /// Field names in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(name, descriptor)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldChange<V>> {
        self.entries.iter()
    }

    /// Number of fields described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fields are described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, FieldChange<V>)> for ChangeMap<V> {
    fn from_iter<T: IntoIterator<Item = (K, FieldChange<V>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a ChangeMap<V> {
    type Item = (&'a String, &'a FieldChange<V>);
    type IntoIter = btree_map::Iter<'a, String, FieldChange<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_marks_changed_and_unchanged() {
        let prev = ProjectedState::from([("womp", "initial womp"), ("diggity", "initial diggity")]);
        let next = ProjectedState::from([("womp", "new womp"), ("diggity", "initial diggity")]);
        let changes = ChangeMap::diff(&prev, &next);

        let expected: ChangeMap<&str> = [
            ("womp", FieldChange::changed(Some("initial womp"))),
            ("diggity", FieldChange::unchanged("initial diggity")),
        ]
        .into_iter()
        .collect();
        assert_eq!(changes, expected);
        assert!(changes.any_changed());
        assert_eq!(changes.changed_keys().collect::<Vec<_>>(), vec!["womp"]);
    }

    #[test]
    fn new_field_has_no_previous_value() {
        let prev = ProjectedState::from([("a", 1)]);
        let next = ProjectedState::from([("a", 1), ("b", 2)]);
        let changes = ChangeMap::diff(&prev, &next);

        assert_eq!(changes.get("b"), Some(&FieldChange::changed(None)));
        assert!(!changes.has_changed("a"));
    }

    #[test]
    fn removed_field_is_absent() {
        let prev = ProjectedState::from([("a", 1), ("gone", 2)]);
        let next = ProjectedState::from([("a", 1)]);
        let changes = ChangeMap::diff(&prev, &next);

        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(!changes.any_changed(), "removal alone is not a change");
    }

    #[test]
    fn nested_values_compare_structurally() {
        let prev = ProjectedState::from([("todos", vec!["dishes".to_string()])]);
        let same = ProjectedState::from([("todos", vec!["dishes".to_string()])]);
        let more = ProjectedState::from([("todos", vec!["dishes".to_string(), "laundry".into()])]);

        assert!(!ChangeMap::diff(&prev, &same).any_changed());
        assert!(ChangeMap::diff(&prev, &more).has_changed("todos"));
    }

    #[test]
    fn nan_bits_compare_equal() {
        let prev = ProjectedState::from([("ratio", f64::NAN.to_bits())]);
        let same = ProjectedState::from([("ratio", f64::NAN.to_bits())]);
        let half = ProjectedState::from([("ratio", 0.5f64.to_bits())]);

        assert!(!ChangeMap::diff(&prev, &same).any_changed());
        assert!(ChangeMap::diff(&prev, &half).has_changed("ratio"));
    }

    #[test]
    fn empty_projection_yields_empty_map() {
        let prev = ProjectedState::from([("a", 1)]);
        let changes = ChangeMap::diff(&prev, &ProjectedState::new());
        assert!(changes.is_empty());
        assert!(!changes.any_changed());
    }
}
