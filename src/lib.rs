//! # Finbridge
//!
//! **Finbridge** is a provider-agnostic integration layer for financial back-office
//! services: ERP accounts receivable, service invoices (NFS-e), payment collection and
//! accounts payable.
//!
//! ## Overview
//!
//! Each capability family is a trait. Concrete backends (an in-memory mock plus one real
//! HTTP provider per family) implement it, and a [`ClientFactory`] picks one by a
//! configuration selector:
//!
//! | Family | Trait | Selector key | Backends |
//! |---|---|---|---|
//! | ERP | [`erp::ErpClient`] | `ERP_CLIENT` | `mock`, `omie` |
//! | Invoice | [`invoice::InvoiceClient`] | `INVOICE_CLIENT` | `mock`, `nfe_io` |
//! | Payment | [`payment::PaymentClient`] | `PAYMENT_CLIENT` | `mock`, `asaas` |
//! | Payables | [`payables::PayablesClient`] | `PAYABLES_CLIENT` | `mock`, `superlogica` |
//!
//! Every verb takes a [`Payload`] and returns a [`FinbridgeResult`] of [`Outcome`]:
//! `{"status": "success", ...}` or `{"status": "not_found"}`. Failures are always errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use finbridge::prelude::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let factory = ClientFactory::new(
//!     Settings::new()
//!         .with("MOCK_PAYMENT_API_KEY", "key-123")
//!         .with("PAYMENT_CLIENT", "mock"),
//! );
//!
//! let mut payments = factory.get_payment_client().unwrap();
//! let created = payments
//!     .create_payment(
//!         Payload::new()
//!             .with("customer_id", "cust-1")
//!             .with("amount", 120.0)
//!             .with("due_date", "2025-05-01"),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(created.get_str("payment_id"), Some("pay-1"));
//! # });
//! ```
//!
//! ## Logging
//!
//! Backends emit `tracing` events; the library never installs a subscriber.

mod config;
mod error;
mod factory;
mod http;
mod mock;
mod payload;
mod provider;
mod registry;

pub mod erp;
pub mod fixtures;
pub mod invoice;
pub mod payables;
pub mod payment;
pub mod validation;

pub mod prelude;

// Re-export core types
pub use config::{CredentialBundle, Settings, DEFAULT_SELECTOR, MOCK_REQUIRE_TOKEN_KEY};
pub use error::{FinbridgeError, FinbridgeResult, ValidationError, ValidationResult};
pub use factory::ClientFactory;
pub use http::HttpTransport;
pub use mock::{MockToken, Record, RecordTable, TokenPolicy, TOKEN_FIELD};
pub use payload::{Outcome, Payload};
pub use provider::{CapabilityFamily, Provider, ProviderExt};
pub use registry::{Constructor, Registry, RegistryBuilder, RegistryError, RegistryResult};

// Re-export async-trait for convenience
pub use async_trait::async_trait;
