//! Invoice capability: service invoices (NFS-e).

mod mock;
mod nfe_io;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{FinbridgeError, FinbridgeResult, ValidationError, ValidationResult};
use crate::payload::{Outcome, Payload};
use crate::provider::Provider;
use crate::validation::{
    country_code, positive_number, required_string, validate_borrower_type, validate_tax_regime,
    validate_taxation_type,
};

pub use mock::{InvoiceStatus, MockInvoiceClient, MockInvoiceConfig};
pub use nfe_io::{NfeIoConfig, NfeIoInvoiceClient};

/// Fields the mock requires to issue an invoice.
pub const REQUIRED_INVOICE_FIELDS: &[&str] = &["customer_id", "amount", "service_description"];

/// Rendition of an issued invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceFormat {
    /// Printable document
    Pdf,
    /// Fiscal XML
    Xml,
}

impl InvoiceFormat {
    /// Path segment and file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceFormat::Pdf => "pdf",
            InvoiceFormat::Xml => "xml",
        }
    }

    /// MIME type of the provider rendition.
    pub fn content_type(&self) -> &'static str {
        match self {
            InvoiceFormat::Pdf => "application/pdf",
            InvoiceFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for InvoiceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloaded invoice document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceArtifact {
    /// Requested rendition
    pub format: InvoiceFormat,
    /// MIME type of `content`
    pub content_type: String,
    /// Raw document bytes
    pub content: Vec<u8>,
}

impl InvoiceArtifact {
    /// Suggested file name, `<id>.<ext>`.
    pub fn file_name(&self, id: &str) -> String {
        format!("{id}.{}", self.format)
    }
}

/// Where invoice borrower data is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowerSource {
    /// Built-in borrower fixtures
    Mock,
    /// The configured ERP's customer registry
    Erp,
}

impl fmt::Display for BorrowerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowerSource::Mock => f.write_str("mock"),
            BorrowerSource::Erp => f.write_str("erp"),
        }
    }
}

/// Service-invoice operations every invoicing backend provides.
#[async_trait]
pub trait InvoiceClient: Provider {
    /// Issue an invoice.
    async fn issue_invoice(&mut self, data: Payload) -> FinbridgeResult<Outcome>;

    /// Cancel an issued invoice.
    async fn cancel_invoice(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome>;

    /// Current status of an invoice.
    async fn get_invoice_status(&self, id: &str) -> FinbridgeResult<Outcome>;

    /// Download an invoice rendition; `None` when the backend does not know the id.
    async fn download_invoice(&self, id: &str, format: InvoiceFormat) -> FinbridgeResult<Option<InvoiceArtifact>> {
        let _ = (id, format);
        Err(FinbridgeError::not_supported(self.name(), "download_invoice"))
    }
}

/// Check a service-invoice payload and normalize its borrower country in place.
///
/// Rules: `cityServiceCode` and `description` are non-blank strings, `servicesAmount` is a
/// number above zero, `taxationType` is a known value when present, and `borrower` is an
/// object whose `type`, `taxRegime` and `address.country` are valid.
pub fn validate_service_invoice(data: &mut Payload) -> ValidationResult<()> {
    required_string("cityServiceCode", data.get("cityServiceCode"))?;
    required_string("description", data.get("description"))?;
    positive_number("servicesAmount", data.get("servicesAmount"))?;
    validate_taxation_type(data.get("taxationType"))?;

    let borrower = match data.get("borrower") {
        Some(Value::Object(borrower)) => borrower,
        _ => return Err(ValidationError::new("borrower", "field 'borrower' must be an object")),
    };
    validate_borrower_type(borrower.get("type"))?;
    validate_tax_regime(borrower.get("taxRegime"))?;
    let country = country_code(borrower.get("address").and_then(|a| a.get("country")))?;

    if let Some(Value::Object(borrower)) = data.as_map_mut().get_mut("borrower") {
        let address = borrower
            .entry("address")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(address) = address {
            address.insert("country".to_string(), Value::from(country));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice(borrower: Value) -> Payload {
        Payload::try_from(json!({
            "cityServiceCode": "101",
            "description": "Consultoria",
            "servicesAmount": 100.0,
            "borrower": borrower
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_invoice_normalizes_country() {
        let mut data = invoice(json!({"type": "LegalEntity", "address": {"country": "Brasil"}}));
        validate_service_invoice(&mut data).unwrap();
        assert_eq!(data.get("borrower").unwrap()["address"]["country"], "BRA");
    }

    #[test]
    fn test_missing_address_defaults_country() {
        let mut data = invoice(json!({"federalTaxNumber": 11111111000191u64}));
        validate_service_invoice(&mut data).unwrap();
        assert_eq!(data.get("borrower").unwrap()["address"]["country"], "BRA");
    }

    #[test]
    fn test_invalid_country_is_rejected() {
        let mut data = invoice(json!({"address": {"country": "XXX"}}));
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "country");
    }

    #[test]
    fn test_rule_failures_name_the_field() {
        let mut data = invoice(json!({"taxRegime": "Lucro"}));
        let err = validate_service_invoice(&mut data).unwrap_err();
        assert_eq!(err.field, "taxRegime");
        assert!(err.accepted.contains(&"LucroReal".to_string()));

        let mut data = invoice(json!({}));
        data.insert("servicesAmount", 0);
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "servicesAmount");

        let mut data = invoice(json!({}));
        data.insert("taxationType", "Sometimes");
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "taxationType");

        let mut data = invoice(json!("not an object"));
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "borrower");
    }

    #[test]
    fn test_non_string_values_are_rejected_not_replaced() {
        let mut data = invoice(json!({"address": {"country": 123}}));
        let err = validate_service_invoice(&mut data).unwrap_err();
        assert_eq!(err.field, "country");
        assert_eq!(data.get("borrower").unwrap()["address"]["country"], json!(123));

        let mut data = invoice(json!({"type": 5}));
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "type");

        let mut data = invoice(json!({"taxRegime": true}));
        let err = validate_service_invoice(&mut data).unwrap_err();
        assert_eq!(err.field, "taxRegime");
        assert!(err.accepted.contains(&"SimplesNacional".to_string()));

        let mut data = invoice(json!({}));
        data.insert("taxationType", 42);
        assert_eq!(validate_service_invoice(&mut data).unwrap_err().field, "taxationType");
    }

    #[test]
    fn test_null_country_defaults() {
        let mut data = invoice(json!({"address": {"country": null}}));
        validate_service_invoice(&mut data).unwrap();
        assert_eq!(data.get("borrower").unwrap()["address"]["country"], "BRA");
    }

    #[test]
    fn test_artifact_file_name() {
        let artifact = InvoiceArtifact {
            format: InvoiceFormat::Xml,
            content_type: InvoiceFormat::Xml.content_type().to_string(),
            content: Vec::new(),
        };
        assert_eq!(artifact.file_name("inv-1"), "inv-1.xml");
    }
}
