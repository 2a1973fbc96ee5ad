#![forbid(unsafe_code)]

//! Caller-supplied projections from store state and dispatch to props.
//!
//! A [`StateProjector`] is a pair of pure functions. The state half runs on
//! construction and on every store notification; the dispatch half runs
//! exactly once, when the binding is built.
//!
//! [`Projector`] adapts two closures. [`whole_state`] and [`raw_dispatch`]
//! are the defaults used when a caller does not care to project.

use crate::props::{BoundActions, ProjectedState};
use crate::store::Dispatch;

/// Key under which [`whole_state`] exposes the state.
pub const DEFAULT_STATE_KEY: &str = "state";

/// Key under which [`raw_dispatch`] exposes the dispatch.
pub const DEFAULT_DISPATCH_KEY: &str = "dispatch";

/// Maps a store's state and dispatch to the fields a module consumes.
pub trait StateProjector<St, A> {
    /// Value type of projected fields; compared with deep equality. `Eq` keeps
    /// that comparison reflexive, so a no-op notification never propagates.
    type Value: Clone + Eq;
    /// Input type taken by bound actions.
    type Input;

    /// Derive fields from a state snapshot.
    fn project_state(&self, state: &St) -> ProjectedState<Self::Value>;

    /// Bind actions to `dispatch`.
    fn bind_actions(&self, dispatch: &Dispatch<A>) -> BoundActions<Self::Input>;
}

/// A [`StateProjector`] built from two closures.
#[derive(Clone)]
pub struct Projector<F, G> {
    map_state: F,
    map_dispatch: G,
}

impl<F, G> std::fmt::Debug for Projector<F, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector").finish_non_exhaustive()
    }
}

impl<F, G> Projector<F, G> {
    /// Pair a state projection with a dispatch projection.
    pub fn new(map_state: F, map_dispatch: G) -> Self {
        Self {
            map_state,
            map_dispatch,
        }
    }
}

impl<St, A, V, I, F, G> StateProjector<St, A> for Projector<F, G>
where
    F: Fn(&St) -> ProjectedState<V>,
    G: Fn(&Dispatch<A>) -> BoundActions<I>,
    V: Clone + Eq,
{
    type Value = V;
    type Input = I;

    fn project_state(&self, state: &St) -> ProjectedState<V> {
        (self.map_state)(state)
    }

    fn bind_actions(&self, dispatch: &Dispatch<A>) -> BoundActions<I> {
        (self.map_dispatch)(dispatch)
    }
}

/// Default state projection: the whole state under [`DEFAULT_STATE_KEY`].
pub fn whole_state<St: Clone>(state: &St) -> ProjectedState<St> {
    ProjectedState::new().with(DEFAULT_STATE_KEY, state.clone())
}

/// Default dispatch projection: the dispatch itself under
/// [`DEFAULT_DISPATCH_KEY`].
pub fn raw_dispatch<A: 'static>(dispatch: &Dispatch<A>) -> BoundActions<A> {
    BoundActions::new().with(DEFAULT_DISPATCH_KEY, dispatch.to_action())
}
