use std::any::Any;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{header, Method, RequestBuilder};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{validate_service_invoice, BorrowerSource, InvoiceArtifact, InvoiceClient, InvoiceFormat};
use crate::config::{CredentialBundle, Settings};
use crate::error::{FinbridgeError, FinbridgeResult, ValidationError};
use crate::fixtures;
use crate::http::HttpTransport;
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};

const BACKEND: &str = "nfe_io";
const DEFAULT_BASE_URL: &str = "https://api.nfse.io/v1";

/// NFE.io credentials and endpoint.
#[derive(Debug, Clone)]
pub struct NfeIoConfig {
    /// `NFE_IO_API_KEY`
    pub api_key: String,
    /// `NFE_IO_COMPANY_ID`
    pub company_id: String,
    /// `NFE_IO_BASE_URL`
    pub base_url: String,
}

impl CredentialBundle for NfeIoConfig {
    const BACKEND: &'static str = "NFE.io";
    const REQUIRED: &'static [&'static str] = &["NFE_IO_API_KEY", "NFE_IO_COMPANY_ID"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("NFE.io: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            api_key: values.next().unwrap_or_default(),
            company_id: values.next().unwrap_or_default(),
            base_url: settings.get_or("NFE_IO_BASE_URL", DEFAULT_BASE_URL).to_string(),
        })
    }
}

/// Service invoices through NFE.io.
#[derive(Debug)]
pub struct NfeIoInvoiceClient {
    config: NfeIoConfig,
    transport: HttpTransport,
}

impl NfeIoInvoiceClient {
    /// Create a client from a credential bundle.
    pub fn new(config: NfeIoConfig) -> FinbridgeResult<Self> {
        let transport = HttpTransport::new(BACKEND, config.base_url.clone())?;
        Ok(Self { config, transport })
    }

    /// Create a client from settings.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        Self::new(NfeIoConfig::from_settings(settings)?)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &NfeIoConfig {
        &self.config
    }

    /// Assemble an issue payload for `service` billed to the borrower with `tax_number`.
    ///
    /// Adds a fresh `externalId` and stamps `issuedOn` with the current UTC time.
    pub fn create_invoice_data(
        &self,
        source: BorrowerSource,
        tax_number: u64,
        service: Payload,
    ) -> FinbridgeResult<Payload> {
        debug!(%source, tax_number, "NFE.io: looking up borrower");
        let borrower = match source {
            BorrowerSource::Mock => fixtures::borrower_by_tax_number(tax_number).cloned(),
            other => {
                return Err(FinbridgeError::not_supported(
                    BACKEND,
                    format!("borrower source '{other}'"),
                ))
            }
        };
        let borrower = borrower.ok_or_else(|| {
            error!(tax_number, "NFE.io: borrower not found");
            ValidationError::new("borrower", format!("no borrower with federal tax number {tax_number}"))
        })?;

        let external_id = Uuid::new_v4().to_string();
        debug!(external_id = %external_id, "NFE.io: generated externalId");

        Ok(service
            .with("borrower", borrower)
            .with("externalId", external_id)
            .with("issuedOn", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)))
    }

    fn invoices_path(&self) -> String {
        format!("companies/{}/serviceinvoices", self.config.company_id)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.transport
            .request(method, path)
            .header(header::AUTHORIZATION, &self.config.api_key)
    }
}

impl Provider for NfeIoInvoiceClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Invoice
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl InvoiceClient for NfeIoInvoiceClient {
    async fn issue_invoice(&mut self, mut data: Payload) -> FinbridgeResult<Outcome> {
        if let Err(err) = validate_service_invoice(&mut data) {
            error!(field = %err.field, "NFE.io: invalid service invoice");
            return Err(err.into());
        }

        debug!("NFE.io: issuing service invoice");
        let builder = self
            .request(Method::POST, &self.invoices_path())
            .json(&data);
        let body = self.transport.send_json(builder).await?;
        info!("NFE.io: service invoice accepted");
        Ok(Outcome::from_response(body))
    }

    async fn cancel_invoice(&mut self, id: &str, _details: Payload) -> FinbridgeResult<Outcome> {
        debug!(id, "NFE.io: cancelling service invoice");
        let path = format!("{}/{id}", self.invoices_path());
        let body = self.transport.send_json(self.request(Method::DELETE, &path)).await?;
        info!(id, "NFE.io: service invoice cancelled");
        Ok(Outcome::from_response(body))
    }

    async fn get_invoice_status(&self, id: &str) -> FinbridgeResult<Outcome> {
        debug!(id, "NFE.io: fetching service invoice");
        let path = format!("{}/{id}", self.invoices_path());
        let body = self.transport.send_json(self.request(Method::GET, &path)).await?;
        Ok(Outcome::from_response(body))
    }

    async fn download_invoice(&self, id: &str, format: InvoiceFormat) -> FinbridgeResult<Option<InvoiceArtifact>> {
        debug!(id, %format, "NFE.io: downloading service invoice");
        let path = format!("{}/{id}/{format}", self.invoices_path());
        let content = self.transport.send_bytes(self.request(Method::GET, &path)).await?;
        Ok(Some(InvoiceArtifact {
            format,
            content_type: format.content_type().to_string(),
            content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> NfeIoInvoiceClient {
        NfeIoInvoiceClient::from_settings(
            &Settings::new()
                .with("NFE_IO_API_KEY", "api-key")
                .with("NFE_IO_COMPANY_ID", "company-1"),
        )
        .unwrap()
    }

    fn service() -> Payload {
        Payload::try_from(fixtures::service(0).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_company_id() {
        match NfeIoConfig::from_settings(&Settings::new().with("NFE_IO_API_KEY", "k")).unwrap_err() {
            FinbridgeError::MissingConfiguration { keys, .. } => {
                assert_eq!(keys, vec!["NFE_IO_COMPANY_ID"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_create_invoice_data_from_fixtures() {
        let client = client();
        for tax_number in [11111111000191u64, 22222222000182, 33333333000173, 44444444000164] {
            let mut data = client
                .create_invoice_data(BorrowerSource::Mock, tax_number, service())
                .unwrap();
            assert_eq!(data.get("borrower").unwrap()["federalTaxNumber"], json!(tax_number));
            assert!(Uuid::parse_str(data.get_str("externalId").unwrap()).is_ok());
            assert!(data.get_str("issuedOn").unwrap().ends_with('Z'));
            assert!(validate_service_invoice(&mut data).is_ok());
        }
    }

    #[test]
    fn test_external_ids_are_fresh() {
        let client = client();
        let a = client
            .create_invoice_data(BorrowerSource::Mock, 11111111000191, service())
            .unwrap();
        let b = client
            .create_invoice_data(BorrowerSource::Mock, 11111111000191, service())
            .unwrap();
        assert_ne!(a.get_str("externalId"), b.get_str("externalId"));
    }

    #[test]
    fn test_unknown_borrower_and_source() {
        let client = client();
        let err = client
            .create_invoice_data(BorrowerSource::Mock, 1, service())
            .unwrap_err();
        assert_eq!(err.as_validation().map(|v| v.field.as_str()), Some("borrower"));

        let err = client
            .create_invoice_data(BorrowerSource::Erp, 11111111000191, service())
            .unwrap_err();
        assert!(matches!(err, FinbridgeError::NotSupported { .. }));
    }

    #[test]
    fn test_paths() {
        assert_eq!(client().invoices_path(), "companies/company-1/serviceinvoices");
    }
}
