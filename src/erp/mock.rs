use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::{ErpClient, REQUIRED_RECEIVABLE_FIELDS};
use crate::config::{CredentialBundle, Settings};
use crate::error::FinbridgeResult;
use crate::mock::{MockToken, Record, RecordTable, TokenPolicy};
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::require_fields;

const BACKEND: &str = "mock";

/// Lifecycle of an accounts-receivable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivableStatus {
    /// Awaiting payment
    Open,
    /// Paid
    Settled,
    /// Cancelled
    Cancelled,
}

impl ReceivableStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivableStatus::Open => "open",
            ReceivableStatus::Settled => "settled",
            ReceivableStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReceivableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the ERP mock.
#[derive(Debug, Clone)]
pub struct MockErpConfig {
    /// `MOCK_ERP_APP_KEY`
    pub app_key: String,
    /// `MOCK_ERP_APP_SECRET`
    pub app_secret: String,
}

impl CredentialBundle for MockErpConfig {
    const BACKEND: &'static str = "mock ERP";
    const REQUIRED: &'static [&'static str] = &["MOCK_ERP_APP_KEY", "MOCK_ERP_APP_SECRET"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("MockERP: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            app_key: values.next().unwrap_or_default(),
            app_secret: values.next().unwrap_or_default(),
        })
    }
}

/// In-memory accounts-receivable backend.
///
/// Ids are `ar-1`, `ar-2`, ... in creation order. Settle and cancel are idempotent and the
/// last lifecycle verb wins.
#[derive(Debug)]
pub struct MockErpClient {
    config: MockErpConfig,
    token: MockToken,
    receivables: RecordTable<ReceivableStatus>,
}

impl MockErpClient {
    /// Create from a credential bundle.
    pub fn new(config: MockErpConfig, policy: TokenPolicy) -> Self {
        let token = MockToken::new("mock ERP", "mock-token", config.app_key.clone(), 4, policy);
        Self {
            config,
            token,
            receivables: RecordTable::new("ar"),
        }
    }

    /// Create from settings, failing fast on missing credentials.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        let config = MockErpConfig::from_settings(settings)?;
        Ok(Self::new(config, TokenPolicy::from_settings(settings)))
    }

    /// Switch the token policy for every mutating verb.
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.token.set_policy(policy);
        self
    }

    /// The loaded credentials.
    pub fn config(&self) -> &MockErpConfig {
        &self.config
    }

    /// Issue (first call) or return the cached session token.
    pub fn get_access_token(&mut self) -> String {
        self.token.issue().to_string()
    }

    /// Stored receivable.
    pub fn record(&self, id: &str) -> Option<&Record<ReceivableStatus>> {
        self.receivables.get(id)
    }

    /// Current status of a receivable.
    pub fn status(&self, id: &str) -> Option<ReceivableStatus> {
        self.receivables.status(id)
    }

    /// Number of receivables created.
    pub fn len(&self) -> usize {
        self.receivables.len()
    }

    /// Whether no receivable has been created.
    pub fn is_empty(&self) -> bool {
        self.receivables.is_empty()
    }

    fn transition(&mut self, id: &str, status: ReceivableStatus, id_field: &str) -> Outcome {
        if self.receivables.set_status(id, status) {
            info!(id, status = %status, "MockERP: receivable transitioned");
            Outcome::success_with(id_field, id)
        } else {
            warn!(id, "MockERP: receivable not found");
            Outcome::NotFound
        }
    }
}

impl Provider for MockErpClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Erp
    }

    fn is_mock(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl ErpClient for MockErpClient {
    async fn create_accounts_receivable(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        debug!("MockERP: creating receivable");
        self.token.authorize(&mut data)?;

        if let Err(err) = require_fields(&data, REQUIRED_RECEIVABLE_FIELDS) {
            error!(field = %err.field, "MockERP: required field missing");
            return Err(err.into());
        }

        let id = self.receivables.insert(data, ReceivableStatus::Open);
        info!(id = %id, "MockERP: receivable created");
        Ok(Outcome::success_with("accounts_receivable_id", id))
    }

    async fn update_accounts_receivable(&mut self, id: &str, mut data: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "MockERP: updating receivable");
        self.token.authorize(&mut data)?;

        if self.receivables.merge(id, data) {
            info!(id, "MockERP: receivable updated");
            Ok(Outcome::success_with("updated_id", id))
        } else {
            warn!(id, "MockERP: receivable not found");
            Ok(Outcome::NotFound)
        }
    }

    async fn settle_accounts_receivable(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "MockERP: settling receivable");
        self.token.authorize(&mut details)?;
        Ok(self.transition(id, ReceivableStatus::Settled, "settled_id"))
    }

    async fn cancel_accounts_receivable(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "MockERP: cancelling receivable");
        self.token.authorize(&mut details)?;
        Ok(self.transition(id, ReceivableStatus::Cancelled, "cancelled_id"))
    }
}
