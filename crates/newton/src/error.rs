#![forbid(unsafe_code)]

//! Error types for connected modules.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors raised while subscribing to a store or propagating an update.
///
/// Caller-supplied code (projections, module constructors) is never wrapped:
/// a panic there unwinds through the binding untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The module exposes an `on_change` slot that cannot be invoked.
    #[error(
        "if a module has an on_change property it must be a function; \
         found a value of type `{found}`"
    )]
    Configuration {
        /// Descriptive type of the offending value.
        found: &'static str,
    },

    /// `subscribe()` was called while a subscription is live and the binding
    /// is configured with [`ResubscribePolicy::Reject`](crate::ResubscribePolicy::Reject).
    #[error("binding `{binding}` is already subscribed to the store")]
    AlreadySubscribed {
        /// Label of the binding that refused the second subscription.
        binding: String,
    },
}

impl ConnectError {
    /// Build a configuration error for a non-callable change hook.
    #[must_use]
    pub fn configuration(found: &'static str) -> Self {
        Self::Configuration { found }
    }

    /// Whether this error reports an integration mistake in the module.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Errors raised while loading a [`ConnectConfig`](crate::ConnectConfig).
#[cfg(feature = "config")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
}
