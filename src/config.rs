//! Configuration for backends and the client factory.
//!
//! All environment-style values live in one [`Settings`] struct that is passed to every
//! backend constructor. Nothing below this module reads process environment directly, so
//! backends can be built in tests from literal key/value pairs.

use std::collections::BTreeMap;

use crate::error::{FinbridgeError, FinbridgeResult};
use crate::provider::CapabilityFamily;

/// Selector used when a family's selector key is absent.
pub const DEFAULT_SELECTOR: &str = "mock";

/// Key that switches mock backends to the caller-supplied token policy.
pub const MOCK_REQUIRE_TOKEN_KEY: &str = "MOCK_REQUIRE_TOKEN";

/// Environment-style key/value configuration.
///
/// # Example
///
/// ```rust
/// use finbridge::{CapabilityFamily, Settings};
///
/// let settings = Settings::new()
///     .with("ERP_CLIENT", "Omie")
///     .with("OMIE_APP_KEY", "key-1234");
///
/// assert_eq!(settings.selector(CapabilityFamily::Erp), "omie");
/// assert_eq!(settings.selector(CapabilityFamily::Payment), "mock");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a `.env` file (if one exists) and the process environment.
    ///
    /// Process environment wins over the `.env` file, matching `dotenvy` semantics.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
        }
        Self::from_pairs(std::env::vars())
    }

    /// Build settings from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a value.
    pub fn without(mut self, key: &str) -> Self {
        self.values.remove(key);
        self
    }

    /// Get a value; blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Get a value or a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Interpret a value as a boolean flag (`true`, `1`, `yes`, `on`).
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                )
            })
            .unwrap_or(false)
    }

    /// The normalized selector for a family (trimmed, lowercase, default `"mock"`).
    pub fn selector(&self, family: CapabilityFamily) -> String {
        self.get(family.selector_key())
            .unwrap_or(DEFAULT_SELECTOR)
            .trim()
            .to_lowercase()
    }

    /// Fetch every key in `keys`, failing with all missing keys at once.
    pub fn require(&self, backend: &str, keys: &[&str]) -> FinbridgeResult<Vec<String>> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|k| self.get(k).is_none())
            .collect();

        if !missing.is_empty() {
            tracing::error!(backend, missing = ?missing, "required configuration absent");
            return Err(FinbridgeError::missing_configuration(backend, missing));
        }

        Ok(keys
            .iter()
            .filter_map(|k| self.get(k))
            .map(str::to_string)
            .collect())
    }
}

/// Typed credential bundle for one backend.
///
/// Implementations check completeness in `from_settings`, so a backend holding a bundle
/// is always fully configured.
pub trait CredentialBundle: Sized {
    /// Backend name used in error messages.
    const BACKEND: &'static str;

    /// Keys the bundle cannot be built without.
    const REQUIRED: &'static [&'static str];

    /// Build the bundle, failing with `MissingConfiguration`.
    fn from_settings(settings: &Settings) -> FinbridgeResult<Self>;
}
