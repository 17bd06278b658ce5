use std::any::Any;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::{debug, error, info};

use super::PaymentClient;
use crate::config::{CredentialBundle, Settings};
use crate::error::{FinbridgeResult, ValidationResult};
use crate::http::HttpTransport;
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::{require_non_empty_fields, validate_billing_type};

const BACKEND: &str = "asaas";
const DEFAULT_BASE_URL: &str = "https://api.asaas.com/v3";
const DEFAULT_BILLING_TYPE: &str = "BOLETO";

/// Asaas credentials and endpoint.
#[derive(Debug, Clone)]
pub struct AsaasConfig {
    /// `ASAAS_API_KEY`
    pub api_key: String,
    /// `ASAAS_BASE_URL`
    pub base_url: String,
}

impl CredentialBundle for AsaasConfig {
    const BACKEND: &'static str = "Asaas";
    const REQUIRED: &'static [&'static str] = &["ASAAS_API_KEY"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("Asaas: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            api_key: values.next().unwrap_or_default(),
            base_url: settings.get_or("ASAAS_BASE_URL", DEFAULT_BASE_URL).to_string(),
        })
    }
}

/// Which payment verb a payload is checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentContext {
    Create,
    Update,
}

/// Check a charge payload. Creation defaults `billingType` to `BOLETO`.
fn validate_payment_payload(data: &mut Payload, context: PaymentContext) -> ValidationResult<()> {
    let required: &[&str] = match context {
        PaymentContext::Create => {
            if !data.contains("billingType") {
                info!("Asaas: billingType not given, defaulting to {DEFAULT_BILLING_TYPE}");
                data.insert("billingType", DEFAULT_BILLING_TYPE);
            }
            &["value", "dueDate", "customer"]
        }
        PaymentContext::Update => &["value", "dueDate", "billingType"],
    };

    require_non_empty_fields(data, required)?;
    validate_billing_type(data.get_str("billingType"))
}

/// Charges through the Asaas API.
#[derive(Debug)]
pub struct AsaasPaymentClient {
    config: AsaasConfig,
    transport: HttpTransport,
}

impl AsaasPaymentClient {
    /// Create a client from a credential bundle.
    pub fn new(config: AsaasConfig) -> FinbridgeResult<Self> {
        let transport = HttpTransport::new(BACKEND, config.base_url.clone())?;
        Ok(Self { config, transport })
    }

    /// Create a client from settings.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        Self::new(AsaasConfig::from_settings(settings)?)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &AsaasConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.transport
            .request(method, path)
            .header("access_token", &self.config.api_key)
    }
}

impl Provider for AsaasPaymentClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Payment
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl PaymentClient for AsaasPaymentClient {
    async fn create_payment(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        if let Err(err) = validate_payment_payload(&mut data, PaymentContext::Create) {
            error!(field = %err.field, "Asaas: invalid payment");
            return Err(err.into());
        }

        debug!("Asaas: creating payment");
        let body = self
            .transport
            .send_json(self.request(Method::POST, "payments").json(&data))
            .await?;
        info!("Asaas: payment created");
        Ok(Outcome::from_response(body))
    }

    async fn cancel_payment(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        details.insert("status", "CANCELLED");
        if let Err(err) = validate_payment_payload(&mut details, PaymentContext::Update) {
            error!(id, field = %err.field, "Asaas: invalid cancellation");
            return Err(err.into());
        }

        debug!(id, "Asaas: cancelling payment");
        let path = format!("payments/{id}");
        let body = self
            .transport
            .send_json(self.request(Method::PUT, &path).json(&details))
            .await?;
        info!(id, "Asaas: payment cancelled");
        Ok(Outcome::from_response(body))
    }

    async fn get_payment_status(&self, id: &str) -> FinbridgeResult<Outcome> {
        debug!(id, "Asaas: fetching payment status");
        let path = format!("payments/{id}/status");
        let body = self.transport.send_json(self.request(Method::GET, &path)).await?;
        Ok(Outcome::from_response(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinbridgeError;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        Payload::try_from(value).unwrap()
    }

    #[test]
    fn test_config_defaults_base_url() {
        let config = AsaasConfig::from_settings(&Settings::new().with("ASAAS_API_KEY", "k")).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(matches!(
            AsaasConfig::from_settings(&Settings::new()),
            Err(FinbridgeError::MissingConfiguration { .. })
        ));
    }

    #[test]
    fn test_create_defaults_billing_type() {
        let mut data = payload(json!({"customer": "cus_1", "value": 50.0, "dueDate": "2025-05-01"}));
        validate_payment_payload(&mut data, PaymentContext::Create).unwrap();
        assert_eq!(data.get_str("billingType"), Some("BOLETO"));
    }

    #[test]
    fn test_create_rejects_unknown_billing_type() {
        let mut data = payload(json!({
            "customer": "cus_1", "value": 50.0, "dueDate": "2025-05-01", "billingType": "CASH"
        }));
        let err = validate_payment_payload(&mut data, PaymentContext::Create).unwrap_err();
        assert_eq!(err.field, "billingType");
        assert_eq!(err.accepted.len(), 4);
    }

    #[test]
    fn test_update_requires_billing_type() {
        let mut data = payload(json!({"value": 50.0, "dueDate": "2025-05-01"}));
        let err = validate_payment_payload(&mut data, PaymentContext::Update).unwrap_err();
        assert_eq!(err.field, "billingType");
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut data = payload(json!({"customer": "cus_1", "value": 0, "dueDate": "2025-05-01"}));
        let err = validate_payment_payload(&mut data, PaymentContext::Create).unwrap_err();
        assert_eq!(err.field, "value");
    }
}
