#![forbid(unsafe_code)]

//! Connect plain modules to an external state store.
//!
//! `newton` subscribes an ordinary object, a [`Module`], to a [`Store`]. The
//! module receives:
//!
//! - props: the fields a [`StateProjector`] derives from the store's state,
//!   merged with actions bound to the store's dispatch;
//! - a [`ChangeMap`] on every update, telling it which of those fields
//!   changed and what they held before.
//!
//! # Architecture
//!
//! - [`store`]: the store contract and the [`Dispatch`] forwarding handle.
//! - [`projection`]: caller-supplied projections and their defaults.
//! - [`props`]: projected state, bound actions, and the merged [`Props`].
//! - [`change`]: per-field [`ChangeMap`] diffing.
//! - [`module`]: the [`Module`] trait, its optional [`ChangeHook`], and the
//!   [`Unsubscribe`] capability.
//! - [`connect`]: the [`ConnectedBinding`] that ties them together.
//!
//! Everything is single-threaded (`Rc`/`RefCell`) and synchronous: a store
//! notification is diffed and propagated before `dispatch()` returns.

pub mod change;
pub mod config;
pub mod connect;
pub mod error;
pub mod module;
pub mod projection;
pub mod props;
pub mod store;

pub use change::{ChangeMap, FieldChange};
pub use config::{ConnectConfig, ResubscribePolicy};
pub use connect::{ConnectedBinding, Connector, connect};
#[cfg(feature = "config")]
pub use error::ConfigError;
pub use error::{ConnectError, Result};
pub use module::{ChangeHook, Module, ModuleBase, OnChange, Unsubscribe};
pub use projection::{
    DEFAULT_DISPATCH_KEY, DEFAULT_STATE_KEY, Projector, StateProjector, raw_dispatch, whole_state,
};
pub use props::{BoundAction, BoundActions, Prop, ProjectedState, Props};
pub use store::{Dispatch, Listener, Store, UnsubscribeFn};
