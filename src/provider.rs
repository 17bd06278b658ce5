//! Provider trait and capability families.
//!
//! Every backend, mock or real, implements `Provider` plus exactly one family trait
//! (`ErpClient`, `InvoiceClient`, `PaymentClient` or `PayablesClient`). Callers only ever
//! hold the family trait object; the concrete type is known to the factory alone.

use std::any::Any;
use std::fmt::{self, Debug};

/// The four capability families a backend can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityFamily {
    /// Accounts receivable
    Erp,
    /// Service invoices
    Invoice,
    /// Payment collection
    Payment,
    /// Accounts payable
    Payables,
}

impl CapabilityFamily {
    /// All families, in declaration order.
    pub const ALL: [CapabilityFamily; 4] = [
        CapabilityFamily::Erp,
        CapabilityFamily::Invoice,
        CapabilityFamily::Payment,
        CapabilityFamily::Payables,
    ];

    /// Configuration key holding this family's selector.
    pub fn selector_key(&self) -> &'static str {
        match self {
            CapabilityFamily::Erp => "ERP_CLIENT",
            CapabilityFamily::Invoice => "INVOICE_CLIENT",
            CapabilityFamily::Payment => "PAYMENT_CLIENT",
            CapabilityFamily::Payables => "PAYABLES_CLIENT",
        }
    }
}

impl fmt::Display for CapabilityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityFamily::Erp => write!(f, "ERP"),
            CapabilityFamily::Invoice => write!(f, "Invoice"),
            CapabilityFamily::Payment => write!(f, "Payment"),
            CapabilityFamily::Payables => write!(f, "Payables"),
        }
    }
}

/// Base trait for all backends.
///
/// # Example
///
/// ```rust
/// use finbridge::{CapabilityFamily, Provider};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Sandbox;
///
/// impl Provider for Sandbox {
///     fn name(&self) -> &str {
///         "sandbox"
///     }
///
///     fn family(&self) -> CapabilityFamily {
///         CapabilityFamily::Payment
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait Provider: Send + Sync + Debug {
    /// Returns the selector this backend is registered under.
    fn name(&self) -> &str;

    /// Returns the capability family this backend implements.
    fn family(&self) -> CapabilityFamily;

    /// Whether this backend talks to an in-memory simulation rather than a network API.
    fn is_mock(&self) -> bool {
        false
    }

    /// Downcast to concrete type for advanced usage.
    fn as_any(&self) -> &dyn Any;
}

/// Extension trait for provider type checking.
pub trait ProviderExt: Provider {
    /// Check if this provider is of type T.
    fn is<T: Provider + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to type T.
    fn downcast_ref<T: Provider + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl<P: Provider + ?Sized> ProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct LedgerStub {
        selector: &'static str,
        simulated: bool,
    }

    impl Provider for LedgerStub {
        fn name(&self) -> &str {
            self.selector
        }

        fn family(&self) -> CapabilityFamily {
            CapabilityFamily::Payables
        }

        fn is_mock(&self) -> bool {
            self.simulated
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct OtherStub;

    impl Provider for OtherStub {
        fn name(&self) -> &str {
            "other"
        }

        fn family(&self) -> CapabilityFamily {
            CapabilityFamily::Erp
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_real_backend_is_not_mock_by_default() {
        assert!(!OtherStub.is_mock());
        let stub = LedgerStub { selector: "ledger", simulated: true };
        assert!(stub.is_mock());
        assert_eq!(stub.family(), CapabilityFamily::Payables);
    }

    #[test]
    fn test_trait_object_downcast() {
        let boxed: Box<dyn Provider> = Box::new(LedgerStub { selector: "ledger", simulated: false });
        assert!(boxed.is::<LedgerStub>());
        assert!(!boxed.is::<OtherStub>());
        assert_eq!(boxed.downcast_ref::<LedgerStub>().map(|s| s.selector), Some("ledger"));
        assert!(boxed.downcast_ref::<OtherStub>().is_none());
    }

    #[test]
    fn test_selector_keys_and_display() {
        let keys: Vec<&str> = CapabilityFamily::ALL.iter().map(|f| f.selector_key()).collect();
        assert_eq!(keys, ["ERP_CLIENT", "INVOICE_CLIENT", "PAYMENT_CLIENT", "PAYABLES_CLIENT"]);
        assert_eq!(CapabilityFamily::Erp.to_string(), "ERP");
        assert_eq!(CapabilityFamily::Payables.to_string(), "Payables");
    }
}
