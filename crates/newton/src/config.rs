#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! With the `config` feature, a [`ConnectConfig`] can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! name = "todos"
//! resubscribe = "reject"
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use crate::error::ConfigError;

/// What `subscribe()` does while a subscription is already live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ResubscribePolicy {
    /// Keep the live subscription; the call is a no-op.
    #[default]
    Ignore,
    /// Fail with [`ConnectError::AlreadySubscribed`](crate::ConnectError::AlreadySubscribed).
    Reject,
    /// Release the live subscription, then subscribe again.
    Replace,
}

/// Settings for a [`ConnectedBinding`](crate::ConnectedBinding).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct ConnectConfig {
    /// Label used in log fields. Defaults to the module's type name.
    pub name: Option<String>,
    /// Behavior of `subscribe()` while already subscribed.
    pub resubscribe: ResubscribePolicy,
}

impl ConnectConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the re-subscribe policy.
    #[must_use]
    pub fn resubscribe(mut self, policy: ResubscribePolicy) -> Self {
        self.resubscribe = policy;
        self
    }

    pub(crate) fn label_or(&self, fallback: &str) -> String {
        self.name.clone().unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(feature = "config")]
impl ConnectConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input or unknown keys.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::UnsupportedFormat`] for other extensions, or a parse
    /// error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Self::from_toml_str(&std::fs::read_to_string(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}
