//! The single point where selectors turn into backends.

use tracing::info;

use crate::config::Settings;
use crate::erp::{ErpClient, MockErpClient, OmieErpClient};
use crate::error::FinbridgeResult;
use crate::invoice::{InvoiceClient, MockInvoiceClient, NfeIoInvoiceClient};
use crate::payables::{MockPayablesClient, PayablesClient, SuperlogicaPayablesClient};
use crate::payment::{AsaasPaymentClient, MockPaymentClient, PaymentClient};
use crate::provider::CapabilityFamily;
use crate::registry::{Constructor, Registry, RegistryBuilder, RegistryResult};

/// Builds capability clients from [`Settings`].
///
/// Each `get_*_client` call reads the family selector (`ERP_CLIENT`, `INVOICE_CLIENT`,
/// `PAYMENT_CLIENT`, `PAYABLES_CLIENT`; default `mock`) and constructs a fresh backend.
///
/// # Example
///
/// ```rust
/// use finbridge::{ClientFactory, Settings};
///
/// let factory = ClientFactory::new(
///     Settings::new()
///         .with("MOCK_ERP_APP_KEY", "key-1234")
///         .with("MOCK_ERP_APP_SECRET", "secret"),
/// );
/// let erp = factory.get_erp_client().unwrap();
/// assert_eq!(erp.name(), "mock");
/// ```
#[derive(Debug)]
pub struct ClientFactory {
    settings: Settings,
    erp: Registry<dyn ErpClient>,
    invoice: Registry<dyn InvoiceClient>,
    payment: Registry<dyn PaymentClient>,
    payables: Registry<dyn PayablesClient>,
}

impl ClientFactory {
    /// Create a factory with every built-in backend registered.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            erp: RegistryBuilder::<dyn ErpClient>::new(CapabilityFamily::Erp)
                .with("mock", mock_erp)
                .with("omie", omie_erp)
                .build(),
            invoice: RegistryBuilder::<dyn InvoiceClient>::new(CapabilityFamily::Invoice)
                .with("mock", mock_invoice)
                .with("nfe_io", nfe_io_invoice)
                .build(),
            payment: RegistryBuilder::<dyn PaymentClient>::new(CapabilityFamily::Payment)
                .with("mock", mock_payment)
                .with("asaas", asaas_payment)
                .build(),
            payables: RegistryBuilder::<dyn PayablesClient>::new(CapabilityFamily::Payables)
                .with("mock", mock_payables)
                .with("superlogica", superlogica_payables)
                .build(),
        }
    }

    /// Create a factory from `.env` and the process environment.
    pub fn from_env() -> Self {
        Self::new(Settings::from_env())
    }

    /// The settings backends are built from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the ERP client named by `ERP_CLIENT`.
    pub fn get_erp_client(&self) -> FinbridgeResult<Box<dyn ErpClient>> {
        build(&self.erp, &self.settings)
    }

    /// Build the invoice client named by `INVOICE_CLIENT`.
    pub fn get_invoice_client(&self) -> FinbridgeResult<Box<dyn InvoiceClient>> {
        build(&self.invoice, &self.settings)
    }

    /// Build the payment client named by `PAYMENT_CLIENT`.
    pub fn get_payment_client(&self) -> FinbridgeResult<Box<dyn PaymentClient>> {
        build(&self.payment, &self.settings)
    }

    /// Build the payables client named by `PAYABLES_CLIENT`.
    pub fn get_payables_client(&self) -> FinbridgeResult<Box<dyn PayablesClient>> {
        build(&self.payables, &self.settings)
    }

    /// Register an ERP backend under a new `selector`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the selector is taken, built-ins
    /// included, and with [`RegistryError::InvalidName`] when it is blank or has whitespace.
    ///
    /// [`RegistryError::AlreadyRegistered`]: crate::RegistryError::AlreadyRegistered
    /// [`RegistryError::InvalidName`]: crate::RegistryError::InvalidName
    pub fn register_erp_provider(
        &mut self,
        selector: &str,
        constructor: Constructor<dyn ErpClient>,
    ) -> RegistryResult<()> {
        info!(family = %self.erp.family(), selector, "registering backend");
        self.erp.register_unique(selector, constructor)
    }

    /// Register an invoice backend under a new `selector`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the selector is taken, built-ins
    /// included, and with [`RegistryError::InvalidName`] when it is blank or has whitespace.
    ///
    /// [`RegistryError::AlreadyRegistered`]: crate::RegistryError::AlreadyRegistered
    /// [`RegistryError::InvalidName`]: crate::RegistryError::InvalidName
    pub fn register_invoice_provider(
        &mut self,
        selector: &str,
        constructor: Constructor<dyn InvoiceClient>,
    ) -> RegistryResult<()> {
        info!(family = %self.invoice.family(), selector, "registering backend");
        self.invoice.register_unique(selector, constructor)
    }

    /// Register a payment backend under a new `selector`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the selector is taken, built-ins
    /// included, and with [`RegistryError::InvalidName`] when it is blank or has whitespace.
    ///
    /// [`RegistryError::AlreadyRegistered`]: crate::RegistryError::AlreadyRegistered
    /// [`RegistryError::InvalidName`]: crate::RegistryError::InvalidName
    pub fn register_payment_provider(
        &mut self,
        selector: &str,
        constructor: Constructor<dyn PaymentClient>,
    ) -> RegistryResult<()> {
        info!(family = %self.payment.family(), selector, "registering backend");
        self.payment.register_unique(selector, constructor)
    }

    /// Register a payables backend under a new `selector`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the selector is taken, built-ins
    /// included, and with [`RegistryError::InvalidName`] when it is blank or has whitespace.
    ///
    /// [`RegistryError::AlreadyRegistered`]: crate::RegistryError::AlreadyRegistered
    /// [`RegistryError::InvalidName`]: crate::RegistryError::InvalidName
    pub fn register_payables_provider(
        &mut self,
        selector: &str,
        constructor: Constructor<dyn PayablesClient>,
    ) -> RegistryResult<()> {
        info!(family = %self.payables.family(), selector, "registering backend");
        self.payables.register_unique(selector, constructor)
    }

    /// Registered selectors for a family, in registration order.
    pub fn selectors(&self, family: CapabilityFamily) -> Vec<&str> {
        match family {
            CapabilityFamily::Erp => self.erp.names(),
            CapabilityFamily::Invoice => self.invoice.names(),
            CapabilityFamily::Payment => self.payment.names(),
            CapabilityFamily::Payables => self.payables.names(),
        }
    }
}

fn build<P: ?Sized>(registry: &Registry<P>, settings: &Settings) -> FinbridgeResult<Box<P>> {
    let selector = settings.selector(registry.family());
    info!(family = %registry.family(), selector = %selector, "resolving client");
    registry.build(&selector, settings)
}

fn mock_erp(settings: &Settings) -> FinbridgeResult<Box<dyn ErpClient>> {
    Ok(Box::new(MockErpClient::from_settings(settings)?))
}

fn omie_erp(settings: &Settings) -> FinbridgeResult<Box<dyn ErpClient>> {
    Ok(Box::new(OmieErpClient::from_settings(settings)?))
}

fn mock_invoice(settings: &Settings) -> FinbridgeResult<Box<dyn InvoiceClient>> {
    Ok(Box::new(MockInvoiceClient::from_settings(settings)?))
}

fn nfe_io_invoice(settings: &Settings) -> FinbridgeResult<Box<dyn InvoiceClient>> {
    Ok(Box::new(NfeIoInvoiceClient::from_settings(settings)?))
}

fn mock_payment(settings: &Settings) -> FinbridgeResult<Box<dyn PaymentClient>> {
    Ok(Box::new(MockPaymentClient::from_settings(settings)?))
}

fn asaas_payment(settings: &Settings) -> FinbridgeResult<Box<dyn PaymentClient>> {
    Ok(Box::new(AsaasPaymentClient::from_settings(settings)?))
}

fn mock_payables(settings: &Settings) -> FinbridgeResult<Box<dyn PayablesClient>> {
    Ok(Box::new(MockPayablesClient::from_settings(settings)?))
}

fn superlogica_payables(settings: &Settings) -> FinbridgeResult<Box<dyn PayablesClient>> {
    Ok(Box::new(SuperlogicaPayablesClient::from_settings(settings)?))
}
