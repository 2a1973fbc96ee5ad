#![forbid(unsafe_code)]

//! Test harness and reference fixtures for newton.
//!
//! - [`MemoryStore`]: a reducer-backed store implementing [`newton::Store`].
//! - [`RecordingModule`]: records every change notification it receives.
//! - [`MisconfiguredModule`]: declares a change hook that is not callable.

pub mod module;
pub mod store;

pub use module::{ChangeRecord, MisconfiguredModule, RecordingModule};
pub use store::MemoryStore;
