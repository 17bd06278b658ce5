//! Prelude module for convenient imports.
//!
//! Re-exports the capability traits, the factory and the payload types.
//!
//! # Example
//!
//! ```rust
//! use finbridge::prelude::*;
//! ```

// Configuration
pub use crate::config::{CredentialBundle, Settings};

// Capability traits
pub use crate::erp::ErpClient;
pub use crate::invoice::{InvoiceClient, InvoiceFormat};
pub use crate::payables::PayablesClient;
pub use crate::payment::PaymentClient;
pub use crate::provider::{CapabilityFamily, Provider, ProviderExt};

// Factory and registry
pub use crate::factory::ClientFactory;
pub use crate::registry::{Registry, RegistryBuilder};

// Payloads and results
pub use crate::mock::TokenPolicy;
pub use crate::payload::{Outcome, Payload};

// Errors
pub use crate::error::{FinbridgeError, FinbridgeResult, ValidationError};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
