use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{InvoiceArtifact, InvoiceClient, InvoiceFormat, REQUIRED_INVOICE_FIELDS};
use crate::config::{CredentialBundle, Settings};
use crate::error::FinbridgeResult;
use crate::mock::{MockToken, Record, RecordTable, TokenPolicy};
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::require_fields;

const BACKEND: &str = "mock";

/// Lifecycle of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    /// Issued and valid
    Issued,
    /// Cancelled
    Cancelled,
}

impl InvoiceStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the invoice mock.
#[derive(Debug, Clone)]
pub struct MockInvoiceConfig {
    /// `MOCK_INVOICE_API_KEY`
    pub api_key: String,
}

impl CredentialBundle for MockInvoiceConfig {
    const BACKEND: &'static str = "mock invoice";
    const REQUIRED: &'static [&'static str] = &["MOCK_INVOICE_API_KEY"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("MockInvoice: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            api_key: values.next().unwrap_or_default(),
        })
    }
}

/// In-memory invoicing backend with `inv-<n>` ids.
#[derive(Debug)]
pub struct MockInvoiceClient {
    token: MockToken,
    invoices: RecordTable<InvoiceStatus>,
}

impl MockInvoiceClient {
    /// Create from a credential bundle.
    pub fn new(config: MockInvoiceConfig, policy: TokenPolicy) -> Self {
        Self {
            token: MockToken::new("mock invoice", "mock-invoice-token", config.api_key, 3, policy),
            invoices: RecordTable::new("inv"),
        }
    }

    /// Create from settings, failing fast on missing credentials.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        let config = MockInvoiceConfig::from_settings(settings)?;
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

    /// Stored invoice.
    pub fn record(&self, id: &str) -> Option<&Record<InvoiceStatus>> {
        self.invoices.get(id)
    }

    /// Current status of an invoice.
    pub fn status(&self, id: &str) -> Option<InvoiceStatus> {
        self.invoices.status(id)
    }

    /// Number of invoices issued.
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    /// Whether no invoice has been issued.
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

fn render(record: &Record<InvoiceStatus>, format: InvoiceFormat) -> InvoiceArtifact {
    let field = |key: &str| match record.fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let (content_type, content) = match format {
        InvoiceFormat::Pdf => (
            "text/plain",
            format!(
                "INVOICE {}\nstatus: {}\ncustomer: {}\namount: {}\nservice: {}\n",
                record.id,
                record.status,
                field("customer_id"),
                field("amount"),
                field("service_description"),
            ),
        ),
        InvoiceFormat::Xml => (
            InvoiceFormat::Xml.content_type(),
            format!(
                "<invoice id=\"{}\" status=\"{}\"><customer>{}</customer><amount>{}</amount><service>{}</service></invoice>",
                record.id,
                record.status,
                field("customer_id"),
                field("amount"),
                field("service_description"),
            ),
        ),
    };

    InvoiceArtifact {
        format,
        content_type: content_type.to_string(),
        content: content.into_bytes(),
    }
}

impl Provider for MockInvoiceClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Invoice
    }

    fn is_mock(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl InvoiceClient for MockInvoiceClient {
    async fn issue_invoice(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        debug!("MockInvoice: issuing invoice");
        self.token.authorize(&mut data)?;

        if let Err(err) = require_fields(&data, REQUIRED_INVOICE_FIELDS) {
            error!(field = %err.field, "MockInvoice: required field missing");
            return Err(err.into());
        }

        let id = self.invoices.insert(data, InvoiceStatus::Issued);
        info!(id = %id, "MockInvoice: invoice issued");
        Ok(Outcome::success_with("invoice_id", id))
    }

    async fn cancel_invoice(&mut self, id: &str, mut details: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "MockInvoice: cancelling invoice");
        self.token.authorize(&mut details)?;

        if self.invoices.set_status(id, InvoiceStatus::Cancelled) {
            info!(id, "MockInvoice: invoice cancelled");
            Ok(Outcome::success_with("cancelled_id", id))
        } else {
            warn!(id, "MockInvoice: invoice not found");
            Ok(Outcome::NotFound)
        }
    }

    async fn get_invoice_status(&self, id: &str) -> FinbridgeResult<Outcome> {
        match self.invoices.status(id) {
            Some(status) => {
                info!(id, status = %status, "MockInvoice: status lookup");
                Ok(Outcome::success_with("invoice_status", status.as_str()))
            }
            None => {
                warn!(id, "MockInvoice: invoice not found");
                Ok(Outcome::NotFound)
            }
        }
    }

    async fn download_invoice(&self, id: &str, format: InvoiceFormat) -> FinbridgeResult<Option<InvoiceArtifact>> {
        Ok(self.invoices.get(id).map(|record| render(record, format)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinbridgeError;
    use serde_json::json;

    fn client() -> MockInvoiceClient {
        MockInvoiceClient::from_settings(&Settings::new().with("MOCK_INVOICE_API_KEY", "inv-key-789")).unwrap()
    }

    fn invoice() -> Payload {
        Payload::try_from(json!({
            "customer_id": "cust-1",
            "amount": 350.0,
            "service_description": "Consultoria"
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            MockInvoiceClient::from_settings(&Settings::new()),
            Err(FinbridgeError::MissingConfiguration { .. })
        ));
    }

    #[test]
    fn test_token_uses_last_three_chars() {
        assert_eq!(client().get_access_token(), "mock-invoice-token-789");
    }

    #[tokio::test]
    async fn test_issue_cancel_and_status() {
        let mut client = client();
        let issued = client.issue_invoice(invoice()).await.unwrap();
        assert_eq!(issued.to_json(), json!({"status": "success", "invoice_id": "inv-1"}));

        let status = client.get_invoice_status("inv-1").await.unwrap();
        assert_eq!(status.get_str("invoice_status"), Some("issued"));

        let cancelled = client.cancel_invoice("inv-1", Payload::new()).await.unwrap();
        assert_eq!(cancelled.get_str("cancelled_id"), Some("inv-1"));
        assert_eq!(client.status("inv-1"), Some(InvoiceStatus::Cancelled));

        let again = client.cancel_invoice("inv-1", Payload::new()).await.unwrap();
        assert!(again.is_success());
    }

    #[tokio::test]
    async fn test_missing_description_is_rejected() {
        let mut client = client();
        let mut data = invoice();
        data.remove("service_description");
        let err = client.issue_invoice(data).await.unwrap_err();
        assert_eq!(
            err.as_validation().map(|v| v.field.as_str()),
            Some("service_description")
        );
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let mut client = client();
        assert!(client.get_invoice_status("inv-1").await.unwrap().is_not_found());
        assert!(client.cancel_invoice("inv-1", Payload::new()).await.unwrap().is_not_found());
        assert!(client
            .download_invoice("inv-1", InvoiceFormat::Pdf)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_download_describes_invoice() {
        let mut client = client();
        client.issue_invoice(invoice()).await.unwrap();

        let pdf = client
            .download_invoice("inv-1", InvoiceFormat::Pdf)
            .await
            .unwrap()
            .unwrap();
        let text = String::from_utf8(pdf.content).unwrap();
        assert!(text.starts_with("INVOICE inv-1"));
        assert!(text.contains("customer: cust-1"));

        let xml = client
            .download_invoice("inv-1", InvoiceFormat::Xml)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(xml.content_type, "application/xml");
        assert!(String::from_utf8(xml.content).unwrap().contains("status=\"issued\""));
    }
}
