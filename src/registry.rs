//! Registry of backend constructors.
//!
//! A `Registry` maps selector strings to constructors for one capability family. The
//! factory owns one registry per family and builds a fresh backend on every lookup.

use std::collections::HashMap;
use std::fmt;

use crate::config::Settings;
use crate::error::{FinbridgeError, FinbridgeResult};
use crate::provider::CapabilityFamily;

/// Builds a backend from settings; may fail with `MissingConfiguration`.
pub type Constructor<P> = fn(&Settings) -> FinbridgeResult<Box<P>>;

/// Errors that can occur while registering constructors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A constructor is already registered under this selector
    #[error("Provider already registered: {0}")]
    AlreadyRegistered(String),

    /// Selector is empty or contains whitespace
    #[error("Invalid provider name: {0:?}")]
    InvalidName(String),
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Selector-keyed constructors for one family.
///
/// Selectors are stored lowercase; lookups are case-insensitive.
///
/// # Example
///
/// ```rust
/// use finbridge::erp::{ErpClient, MockErpClient};
/// use finbridge::{CapabilityFamily, Registry, Settings};
///
/// let mut registry: Registry<dyn ErpClient> = Registry::new(CapabilityFamily::Erp);
/// registry.register("mock", |s| Ok(Box::new(MockErpClient::from_settings(s)?)));
///
/// let settings = Settings::new()
///     .with("MOCK_ERP_APP_KEY", "key-1234")
///     .with("MOCK_ERP_APP_SECRET", "secret");
/// assert!(registry.build("MOCK", &settings).is_ok());
/// assert!(registry.build("sap", &settings).is_err());
/// ```
pub struct Registry<P: ?Sized> {
    family: CapabilityFamily,
    constructors: HashMap<String, Constructor<P>>,
    ordered: Vec<String>,
}

impl<P: ?Sized> Registry<P> {
    /// Create a new empty registry.
    pub fn new(family: CapabilityFamily) -> Self {
        Self {
            family,
            constructors: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// The family this registry serves.
    pub fn family(&self) -> CapabilityFamily {
        self.family
    }

    /// Register a constructor, replacing any existing one under the same selector.
    pub fn register(&mut self, selector: &str, constructor: Constructor<P>) {
        let selector = normalize(selector);
        if !self.constructors.contains_key(&selector) {
            self.ordered.push(selector.clone());
        }
        self.constructors.insert(selector, constructor);
    }

    /// Register a constructor, returning an error if the selector is taken or malformed.
    pub fn register_unique(&mut self, selector: &str, constructor: Constructor<P>) -> RegistryResult<()> {
        let normalized = normalize(selector);
        if normalized.is_empty() || normalized.contains(char::is_whitespace) {
            return Err(RegistryError::InvalidName(selector.to_string()));
        }
        if self.constructors.contains_key(&normalized) {
            return Err(RegistryError::AlreadyRegistered(normalized));
        }
        self.ordered.push(normalized.clone());
        self.constructors.insert(normalized, constructor);
        Ok(())
    }

    /// Construct the backend registered under `selector`.
    ///
    /// Unknown selectors fail with `UnsupportedProvider`; constructor errors propagate.
    pub fn build(&self, selector: &str, settings: &Settings) -> FinbridgeResult<Box<P>> {
        let normalized = normalize(selector);
        match self.constructors.get(&normalized) {
            Some(constructor) => {
                tracing::debug!(family = %self.family, selector = %normalized, "constructing backend");
                constructor(settings)
            }
            None => {
                tracing::error!(family = %self.family, selector = %normalized, "unsupported provider selector");
                Err(FinbridgeError::UnsupportedProvider {
                    family: self.family,
                    selector: normalized,
                })
            }
        }
    }

    /// Check if a selector is registered.
    pub fn contains(&self, selector: &str) -> bool {
        self.constructors.contains_key(&normalize(selector))
    }

    /// Selectors in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered selectors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<P: ?Sized> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("family", &self.family)
            .field("selectors", &self.ordered)
            .finish()
    }
}

/// Builder for creating registries with fluent API.
pub struct RegistryBuilder<P: ?Sized> {
    registry: Registry<P>,
}

impl<P: ?Sized> RegistryBuilder<P> {
    /// Create a new registry builder.
    pub fn new(family: CapabilityFamily) -> Self {
        Self {
            registry: Registry::new(family),
        }
    }

    /// Add a constructor to the registry.
    pub fn with(mut self, selector: &str, constructor: Constructor<P>) -> Self {
        self.registry.register(selector, constructor);
        self
    }

    /// Build the registry.
    pub fn build(self) -> Registry<P> {
        self.registry
    }
}

fn normalize(selector: &str) -> String {
    selector.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use std::any::Any;

    #[derive(Debug)]
    struct TestBackend {
        name: &'static str,
    }

    impl Provider for TestBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn family(&self) -> CapabilityFamily {
            CapabilityFamily::Payment
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn alpha(_: &Settings) -> FinbridgeResult<Box<dyn Provider>> {
        Ok(Box::new(TestBackend { name: "alpha" }))
    }

    fn beta(_: &Settings) -> FinbridgeResult<Box<dyn Provider>> {
        Ok(Box::new(TestBackend { name: "beta" }))
    }

    fn needs_key(settings: &Settings) -> FinbridgeResult<Box<dyn Provider>> {
        settings.require("gamma", &["GAMMA_KEY"])?;
        Ok(Box::new(TestBackend { name: "gamma" }))
    }

    #[test]
    fn test_registry_register_and_build() {
        let mut registry: Registry<dyn Provider> = Registry::new(CapabilityFamily::Payment);
        registry.register("alpha", alpha);

        let backend = registry.build("alpha", &Settings::new()).unwrap();
        assert_eq!(backend.name(), "alpha");
        assert!(registry.contains("ALPHA"));
    }

    #[test]
    fn test_registry_unknown_selector() {
        let registry: Registry<dyn Provider> = Registry::new(CapabilityFamily::Payment);
        match registry.build(" Stripe ", &Settings::new()).unwrap_err() {
            FinbridgeError::UnsupportedProvider { family, selector } => {
                assert_eq!(family, CapabilityFamily::Payment);
                assert_eq!(selector, "stripe");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_registry_constructor_errors_propagate() {
        let mut registry: Registry<dyn Provider> = Registry::new(CapabilityFamily::Payment);
        registry.register("gamma", needs_key);
        assert!(matches!(
            registry.build("gamma", &Settings::new()),
            Err(FinbridgeError::MissingConfiguration { .. })
        ));
        assert!(registry
            .build("gamma", &Settings::new().with("GAMMA_KEY", "k"))
            .is_ok());
    }

    #[test]
    fn test_registry_replace_keeps_order() {
        let mut registry: Registry<dyn Provider> = Registry::new(CapabilityFamily::Payment);
        registry.register("a", alpha);
        registry.register("b", beta);
        registry.register("A", beta);

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.build("a", &Settings::new()).unwrap().name(), "beta");
    }

    #[test]
    fn test_registry_unique_registration() {
        let mut registry: Registry<dyn Provider> = Registry::new(CapabilityFamily::Payment);
        assert!(registry.register_unique("alpha", alpha).is_ok());
        assert_eq!(
            registry.register_unique("Alpha", beta),
            Err(RegistryError::AlreadyRegistered("alpha".to_string()))
        );
        assert!(matches!(
            registry.register_unique("two words", beta),
            Err(RegistryError::InvalidName(_))
        ));
    }

    #[test]
    fn test_registry_builder() {
        let registry: Registry<dyn Provider> = RegistryBuilder::new(CapabilityFamily::Payment)
            .with("a", alpha)
            .with("b", beta)
            .build();

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.family(), CapabilityFamily::Payment);
    }
}
