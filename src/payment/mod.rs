//! Payment capability: charges, cancellations and provider webhooks.

mod asaas;
mod mock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::FinbridgeResult;
use crate::payload::{Outcome, Payload};
use crate::provider::Provider;

pub use asaas::{AsaasConfig, AsaasPaymentClient};
pub use mock::{MockPaymentClient, MockPaymentConfig, PaymentStatus};

/// Fields the mock requires to create a payment.
pub const REQUIRED_PAYMENT_FIELDS: &[&str] = &["customer_id", "amount", "due_date"];

/// Dotted paths kept when flattening a payment webhook.
pub const WEBHOOK_PAYMENT_FIELDS: &[&str] = &[
    "event",
    "payment.id",
    "payment.status",
    "payment.paymentDate",
    "payment.value",
    "payment.netValue",
    "payment.billingType",
    "payment.customer",
    "payment.invoiceUrl",
    "payment.bankSlipUrl",
    "payment.transactionReceiptUrl",
];

/// Follow a dotted path (`payment.id`) through nested objects.
pub fn extract_nested_field<'a>(payload: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut value = payload.get(parts.next()?)?;
    for part in parts {
        value = value.as_object()?.get(part)?;
    }
    Some(value)
}

/// Flatten a webhook into `WEBHOOK_PAYMENT_FIELDS`; absent paths map to `null`.
pub fn flatten_webhook(payload: &Payload) -> Payload {
    let mut flat = Payload::new();
    for field in WEBHOOK_PAYMENT_FIELDS {
        let value = extract_nested_field(payload.as_map(), field)
            .cloned()
            .unwrap_or(Value::Null);
        debug!(field, value = %value, "webhook field");
        flat.insert(*field, value);
    }
    flat
}

/// Payment operations every payment backend provides.
#[async_trait]
pub trait PaymentClient: Provider {
    /// Create a charge.
    async fn create_payment(&mut self, data: Payload) -> FinbridgeResult<Outcome>;

    /// Cancel a charge.
    async fn cancel_payment(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;

    /// Current status of a charge.
    async fn get_payment_status(&self, id: &str) -> FinbridgeResult<Outcome>;

    /// Reduce a provider webhook to the fields in [`WEBHOOK_PAYMENT_FIELDS`].
    async fn handle_payment_webhook(&mut self, payload: Payload) -> FinbridgeResult<Payload> {
        info!(backend = self.name(), "processing payment webhook");
        Ok(flatten_webhook(&payload))
    }

    /// Bank slip URL from a create or status response; empty when absent.
    fn get_payment_link(&self, response: &Outcome) -> String {
        match response.get_str("bankSlipUrl").filter(|link| !link.is_empty()) {
            Some(link) => {
                info!(backend = self.name(), link, "bank slip link found");
                link.to_string()
            }
            None => {
                warn!(backend = self.name(), "no bank slip link in response");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook() -> Payload {
        Payload::try_from(json!({
            "event": "PAYMENT_RECEIVED",
            "payment": {
                "id": "pay_123",
                "status": "RECEIVED",
                "value": 100.0,
                "customer": "cus_1",
                "bankSlipUrl": "https://example.com/slip"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_nested_field() {
        let payload = webhook();
        assert_eq!(
            extract_nested_field(payload.as_map(), "payment.id"),
            Some(&json!("pay_123"))
        );
        assert_eq!(extract_nested_field(payload.as_map(), "payment.netValue"), None);
        assert_eq!(extract_nested_field(payload.as_map(), "event.id"), None);
        assert_eq!(extract_nested_field(payload.as_map(), "missing"), None);
    }

    #[test]
    fn test_flatten_webhook_keeps_every_field() {
        let flat = flatten_webhook(&webhook());
        assert_eq!(flat.len(), WEBHOOK_PAYMENT_FIELDS.len());
        assert_eq!(flat.get_str("event"), Some("PAYMENT_RECEIVED"));
        assert_eq!(flat.get_str("payment.status"), Some("RECEIVED"));
        assert_eq!(flat.get("payment.paymentDate"), Some(&Value::Null));
    }
}
