use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::PayablesClient;
use crate::config::{CredentialBundle, Settings};
use crate::error::FinbridgeResult;
use crate::mock::{MockToken, Record, RecordTable, TokenPolicy};
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};

const BACKEND: &str = "mock";

/// Lifecycle of a payable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayableStatus {
    /// Awaiting payment
    Open,
    /// Paid
    Settled,
    /// Cancelled
    Cancelled,
}

impl PayableStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayableStatus::Open => "open",
            PayableStatus::Settled => "settled",
            PayableStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PayableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the payables mock.
#[derive(Debug, Clone)]
pub struct MockPayablesConfig {
    /// `MOCK_PAYABLES_API_KEY`
    pub api_key: String,
}

impl CredentialBundle for MockPayablesConfig {
    const BACKEND: &'static str = "mock payables";
    const REQUIRED: &'static [&'static str] = &["MOCK_PAYABLES_API_KEY"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            api_key: values.next().unwrap_or_default(),
        })
    }
}

/// In-memory payables backend with `payable-<n>` ids.
///
/// Creation accepts any payload. Every verb answers with `payable_id`.
#[derive(Debug)]
pub struct MockPayablesClient {
    token: MockToken,
    payables: RecordTable<PayableStatus>,
}

impl MockPayablesClient {
    /// Create from a credential bundle.
    pub fn new(config: MockPayablesConfig, policy: TokenPolicy) -> Self {
        Self {
            token: MockToken::new("mock payables", "mock-payables-token", config.api_key, 3, policy),
            payables: RecordTable::new("payable"),
        }
    }

    /// Create from settings, failing fast on missing credentials.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        let config = MockPayablesConfig::from_settings(settings)?;
        Ok(Self::new(config, TokenPolicy::from_settings(settings)))
    }

    /// Switch the token policy for every mutating verb.
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.token.set_policy(policy);
        self
    }

    /// Issue (first call) or return the cached session token.
    pub fn get_access_token(&mut self) -> String {
        self.token.issue().to_string()
    }

    /// Stored payable.
    pub fn record(&self, id: &str) -> Option<&Record<PayableStatus>> {
        self.payables.get(id)
    }

    /// Current status of a payable.
    pub fn status(&self, id: &str) -> Option<PayableStatus> {
        self.payables.status(id)
    }

    /// Number of payables created.
    pub fn len(&self) -> usize {
        self.payables.len()
    }

    /// Whether no payable has been created.
    pub fn is_empty(&self) -> bool {
        self.payables.is_empty()
    }

    fn transition(&mut self, id: &str, status: PayableStatus) -> Outcome {
        if self.payables.set_status(id, status) {
            info!(id, status = %status, "MockPayables: payable transitioned");
            Outcome::success_with("payable_id", id)
        } else {
            warn!(id, "MockPayables: payable not found");
            Outcome::NotFound
        }
    }
}

impl Provider for MockPayablesClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Payables
    }

    fn is_mock(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl PayablesClient for MockPayablesClient {
    async fn create_payable(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        debug!("MockPayables: creating payable");
        self.token.authorize(&mut data)?;

        let id = self.payables.insert(data, PayableStatus::Open);
        info!(id = %id, "MockPayables: payable created");
        Ok(Outcome::success_with("payable_id", id))
    }

    async fn settle_payable(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        self.token.authorize(&mut details)?;
        Ok(self.transition(id, PayableStatus::Settled))
    }

    async fn cancel_payable(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        self.token.authorize(&mut details)?;
        Ok(self.transition(id, PayableStatus::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MockPayablesClient {
        MockPayablesClient::from_settings(&Settings::new().with("MOCK_PAYABLES_API_KEY", "payables-key-321")).unwrap()
    }

    #[test]
    fn test_token_uses_last_three_chars() {
        assert_eq!(client().get_access_token(), "mock-payables-token-321");
    }

    #[tokio::test]
    async fn test_create_accepts_any_payload() {
        let mut client = client();
        let outcome = client.create_payable(Payload::new()).await.unwrap();
        assert_eq!(outcome.to_json(), json!({"status": "success", "payable_id": "payable-1"}));
        assert_eq!(client.status("payable-1"), Some(PayableStatus::Open));
    }

    #[tokio::test]
    async fn test_last_lifecycle_verb_wins() {
        let mut client = client();
        client.create_payable(Payload::new().with("VL_VALOR_MD", 10)).await.unwrap();

        let settled = client.settle_payable("payable-1", Payload::new()).await.unwrap();
        assert_eq!(settled.get_str("payable_id"), Some("payable-1"));
        assert_eq!(client.status("payable-1"), Some(PayableStatus::Settled));

        let cancelled = client.cancel_payable("payable-1", Payload::new()).await.unwrap();
        assert_eq!(cancelled.get_str("payable_id"), Some("payable-1"));
        assert_eq!(client.status("payable-1"), Some(PayableStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_unknown_payable() {
        let mut client = client();
        assert!(client.settle_payable("payable-1", Payload::new()).await.unwrap().is_not_found());
        assert!(client.cancel_payable("payable-1", Payload::new()).await.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let mut client = client();
        client.create_payable(Payload::new()).await.unwrap();
        client.cancel_payable("payable-1", Payload::new()).await.unwrap();
        let next = client.create_payable(Payload::new()).await.unwrap();
        assert_eq!(next.get_str("payable_id"), Some("payable-2"));
        assert_eq!(client.len(), 2);
    }
}
