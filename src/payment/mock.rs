use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::{flatten_webhook, PaymentClient, REQUIRED_PAYMENT_FIELDS};
use crate::config::{CredentialBundle, Settings};
use crate::error::FinbridgeResult;
use crate::mock::{MockToken, Record, RecordTable, TokenPolicy};
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::require_fields;

const BACKEND: &str = "mock";

/// Lifecycle of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Created, awaiting payment
    Pending,
    /// Received or confirmed
    Paid,
    /// Cancelled or deleted
    Cancelled,
    /// Past due date
    Overdue,
    /// Refunded after payment
    Refunded,
}

impl PaymentStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Map a provider webhook status onto the local lifecycle.
    pub fn from_provider(status: &str) -> Option<Self> {
        match status.trim().to_uppercase().as_str() {
            "RECEIVED" | "CONFIRMED" => Some(PaymentStatus::Paid),
            "CANCELLED" | "DELETED" => Some(PaymentStatus::Cancelled),
            "OVERDUE" => Some(PaymentStatus::Overdue),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            "PENDING" => Some(PaymentStatus::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the payment mock.
#[derive(Debug, Clone)]
pub struct MockPaymentConfig {
    /// `MOCK_PAYMENT_API_KEY`
    pub api_key: String,
}

impl CredentialBundle for MockPaymentConfig {
    const BACKEND: &'static str = "mock payment";
    const REQUIRED: &'static [&'static str] = &["MOCK_PAYMENT_API_KEY"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("MockPayment: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            api_key: values.next().unwrap_or_default(),
        })
    }
}

/// In-memory payment backend with `pay-<n>` ids.
///
/// Webhooks naming a known payment move it to the mapped status.
#[derive(Debug)]
pub struct MockPaymentClient {
    token: MockToken,
    payments: RecordTable<PaymentStatus>,
}

impl MockPaymentClient {
    /// Create from a credential bundle.
    pub fn new(config: MockPaymentConfig, policy: TokenPolicy) -> Self {
        Self {
            token: MockToken::new("mock payment", "mock-payment-token", config.api_key, 3, policy),
            payments: RecordTable::new("pay"),
        }
    }

    /// Create from settings, failing fast on missing credentials.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        let config = MockPaymentConfig::from_settings(settings)?;
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

    /// Stored payment.
    pub fn record(&self, id: &str) -> Option<&Record<PaymentStatus>> {
        self.payments.get(id)
    }

    /// Current status of a payment.
    pub fn status(&self, id: &str) -> Option<PaymentStatus> {
        self.payments.status(id)
    }

    /// Number of payments created.
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Whether no payment has been created.
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl Provider for MockPaymentClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Payment
    }

    fn is_mock(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl PaymentClient for MockPaymentClient {
    async fn create_payment(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        debug!("MockPayment: creating payment");
        self.token.authorize(&mut data)?;

        if let Err(err) = require_fields(&data, REQUIRED_PAYMENT_FIELDS) {
            error!(field = %err.field, "MockPayment: required field missing");
            return Err(err.into());
        }

        let id = self.payments.insert(data, PaymentStatus::Pending);
        info!(id = %id, "MockPayment: payment created");
        Ok(Outcome::success_with("payment_id", id))
    }

    async fn cancel_payment(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "MockPayment: cancelling payment");
        self.token.authorize(&mut details)?;

        if self.payments.set_status(id, PaymentStatus::Cancelled) {
            info!(id, "MockPayment: payment cancelled");
            Ok(Outcome::success_with("cancelled_id", id))
        } else {
            warn!(id, "MockPayment: payment not found");
            Ok(Outcome::NotFound)
        }
    }

    async fn get_payment_status(&self, id: &str) -> FinbridgeResult<Outcome> {
        match self.payments.status(id) {
            Some(status) => {
                info!(id, status = %status, "MockPayment: status lookup");
                Ok(Outcome::success_with("payment_status", status.as_str()))
            }
            None => {
                warn!(id, "MockPayment: payment not found");
                Ok(Outcome::NotFound)
            }
        }
    }

    /// Applies the mapped status to a known payment.
    ///
    /// Exempt from the token policy: webhooks originate at the provider, which never holds
    /// a caller session token.
    async fn handle_payment_webhook(&mut self, payload: Payload) -> FinbridgeResult<Payload> {
        info!("MockPayment: processing webhook");
        let flat = flatten_webhook(&payload);

        let id = flat.get_str("payment.id");
        let status = flat.get_str("payment.status").and_then(PaymentStatus::from_provider);
        match (id, status) {
            (Some(id), Some(status)) if self.payments.set_status(id, status) => {
                info!(id, status = %status, "MockPayment: webhook applied");
            }
            (Some(id), _) => {
                warn!(id, "MockPayment: webhook not applied");
            }
            (None, _) => {
                warn!("MockPayment: webhook without payment id");
            }
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MockPaymentClient {
        MockPaymentClient::from_settings(&Settings::new().with("MOCK_PAYMENT_API_KEY", "pay-key-456")).unwrap()
    }

    fn payment() -> Payload {
        Payload::try_from(json!({
            "customer_id": "cust-9",
            "amount": 120.0,
            "due_date": "2025-05-01"
        }))
        .unwrap()
    }

    fn webhook(id: &str, status: &str) -> Payload {
        Payload::try_from(json!({
            "event": "PAYMENT_UPDATED",
            "payment": {"id": id, "status": status}
        }))
        .unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(PaymentStatus::from_provider("RECEIVED"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_provider("confirmed"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_provider("DELETED"), Some(PaymentStatus::Cancelled));
        assert_eq!(PaymentStatus::from_provider("OVERDUE"), Some(PaymentStatus::Overdue));
        assert_eq!(PaymentStatus::from_provider("REFUNDED"), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::from_provider("AWAITING_RISK_ANALYSIS"), None);
    }

    #[test]
    fn test_token_uses_last_three_chars() {
        assert_eq!(client().get_access_token(), "mock-payment-token-456");
    }

    #[tokio::test]
    async fn test_create_and_status() {
        let mut client = client();
        let created = client.create_payment(payment()).await.unwrap();
        assert_eq!(created.to_json(), json!({"status": "success", "payment_id": "pay-1"}));

        let status = client.get_payment_status("pay-1").await.unwrap();
        assert_eq!(
            status.to_json(),
            json!({"status": "success", "payment_status": "pending"})
        );
    }

    #[tokio::test]
    async fn test_missing_due_date() {
        let mut client = client();
        let mut data = payment();
        data.remove("due_date");
        let err = client.create_payment(data).await.unwrap_err();
        assert_eq!(err.as_validation().map(|v| v.field.as_str()), Some("due_date"));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_moves_payment_to_paid() {
        let mut client = client();
        client.create_payment(payment()).await.unwrap();

        let flat = client
            .handle_payment_webhook(webhook("pay-1", "RECEIVED"))
            .await
            .unwrap();
        assert_eq!(flat.get_str("payment.id"), Some("pay-1"));
        assert_eq!(client.status("pay-1"), Some(PaymentStatus::Paid));

        client
            .handle_payment_webhook(webhook("pay-1", "REFUNDED"))
            .await
            .unwrap();
        assert_eq!(client.status("pay-1"), Some(PaymentStatus::Refunded));
    }

    #[tokio::test]
    async fn test_webhook_for_unknown_payment_is_flattened_only() {
        let mut client = client();
        let flat = client
            .handle_payment_webhook(webhook("pay-7", "RECEIVED"))
            .await
            .unwrap();
        assert_eq!(flat.get_str("payment.status"), Some("RECEIVED"));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_needs_no_token_under_caller_supplied_policy() {
        let mut client = client().with_token_policy(TokenPolicy::CallerSupplied);
        let token = client.get_access_token();
        client
            .create_payment(payment().with("token", token))
            .await
            .unwrap();

        client
            .handle_payment_webhook(webhook("pay-1", "CONFIRMED"))
            .await
            .unwrap();
        assert_eq!(client.status("pay-1"), Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn test_payment_link_absent_for_mock() {
        let mut client = client();
        let created = client.create_payment(payment()).await.unwrap();
        assert_eq!(client.get_payment_link(&created), "");
    }
}
