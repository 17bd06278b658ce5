//! ERP capability: accounts receivable.

mod mock;
mod omie;

use async_trait::async_trait;

use crate::error::FinbridgeResult;
use crate::payload::{Outcome, Payload};
use crate::provider::Provider;

pub use mock::{MockErpClient, MockErpConfig, ReceivableStatus};
pub use omie::{OmieConfig, OmieErpClient};

/// Fields every accounts-receivable record must carry on creation.
pub const REQUIRED_RECEIVABLE_FIELDS: &[&str] = &[
    "codigo_cliente_fornecedor",
    "data_vencimento",
    "valor_documento",
    "codigo_categoria",
    "id_conta_corrente",
];

/// Accounts-receivable operations every ERP backend provides.
#[async_trait]
pub trait ErpClient: Provider {
    /// Create a receivable; success carries `accounts_receivable_id` (mocks) or the
    /// provider's response.
    async fn create_accounts_receivable(&mut self, data: Payload) -> FinbridgeResult<Outcome>;

    /// Merge new fields into an existing receivable.
    async fn update_accounts_receivable(&mut self, id: &str, data: Payload) -> FinbridgeResult<Outcome>;

    /// Mark a receivable as paid. `details` carries settlement data where the backend needs it.
    async fn settle_accounts_receivable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;

    /// Cancel a receivable.
    async fn cancel_accounts_receivable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;
}
