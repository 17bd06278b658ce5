//! Payables capability: bills owed to suppliers.

mod mock;
mod superlogica;

use async_trait::async_trait;

use crate::error::FinbridgeResult;
use crate::payload::{Outcome, Payload};
use crate::provider::Provider;

pub use mock::{MockPayablesClient, MockPayablesConfig, PayableStatus};
pub use superlogica::{SuperlogicaConfig, SuperlogicaPayablesClient, REQUIRED_MOVEMENT_FIELDS};

/// Payable operations every payables backend provides.
#[async_trait]
pub trait PayablesClient: Provider {
    /// Register a payable.
    async fn create_payable(&mut self, data: Payload) -> FinbridgeResult<Outcome>;

    /// Mark a payable as paid.
    async fn settle_payable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;

    /// Cancel a payable.
    async fn cancel_payable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;
}
