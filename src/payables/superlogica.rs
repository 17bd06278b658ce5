use std::any::Any;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, error, info};

use super::PayablesClient;
use crate::config::{CredentialBundle, Settings};
use crate::error::{FinbridgeResult, ValidationError};
use crate::http::HttpTransport;
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::require_non_empty_fields;

const BACKEND: &str = "superlogica";
const MOVEMENTS_PATH: &str = "v2/condor/MovimentacoesDiretas/";
const MOVEMENT_POST_PATH: &str = "v2/condor/MovimentacoesDiretas/post";
const DOCUMENTS_PATH: &str = "v2/condor/documentos";

/// Fields a direct bank movement needs on creation.
pub const REQUIRED_MOVEMENT_FIELDS: &[&str] = &[
    "DT_ENTRADA_MD",
    "ST_CONTA_CONT",
    "VL_VALOR_MD",
    "ID_CONTABANCO_CB",
    "ID_CONDOMINIO_COND",
];

/// Superlógica credentials and endpoint.
#[derive(Debug, Clone)]
pub struct SuperlogicaConfig {
    /// `SUPERLOGICA_BASE_URL`
    pub base_url: String,
    /// `SUPERLOGICA_APP_TOKEN`
    pub app_token: String,
    /// `SUPERLOGICA_ACCESS_TOKEN`
    pub access_token: String,
}

impl CredentialBundle for SuperlogicaConfig {
    const BACKEND: &'static str = "Superlogica";
    const REQUIRED: &'static [&'static str] = &[
        "SUPERLOGICA_BASE_URL",
        "SUPERLOGICA_APP_TOKEN",
        "SUPERLOGICA_ACCESS_TOKEN",
    ];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("Superlogica: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            base_url: values.next().unwrap_or_default(),
            app_token: values.next().unwrap_or_default(),
            access_token: values.next().unwrap_or_default(),
        })
    }
}

/// Payables (direct bank movements) through the Superlógica condominium API.
#[derive(Debug)]
pub struct SuperlogicaPayablesClient {
    config: SuperlogicaConfig,
    transport: HttpTransport,
}

/// Render payload values as flat form or query pairs.
fn form_pairs(data: &Payload) -> Vec<(String, String)> {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

impl SuperlogicaPayablesClient {
    /// Create a client from a credential bundle.
    pub fn new(config: SuperlogicaConfig) -> FinbridgeResult<Self> {
        let transport = HttpTransport::new(BACKEND, config.base_url.clone())?;
        Ok(Self { config, transport })
    }

    /// Create a client from settings.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        Self::new(SuperlogicaConfig::from_settings(settings)?)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &SuperlogicaConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.transport
            .request(method, path)
            .header("app_token", &self.config.app_token)
            .header("access_token", &self.config.access_token)
    }

    async fn post_movement(&self, id: &str, action: &str, details: &Payload) -> FinbridgeResult<Outcome> {
        info!(id, action, "Superlogica: posting movement");
        let builder = self
            .request(Method::PUT, MOVEMENT_POST_PATH)
            .query(&form_pairs(details));
        let body = self.transport.send_json(builder).await?;
        Ok(Outcome::from_response(body))
    }

    /// Attach a document to a condominium.
    ///
    /// `publish` is the Superlógica publication rule, `1..=4` (4 keeps it unpublished).
    pub async fn upload_attachment(
        &self,
        file_name: &str,
        content: Vec<u8>,
        condominium_id: &str,
        publish: u8,
    ) -> FinbridgeResult<Outcome> {
        if !(1..=4).contains(&publish) {
            error!(publish, "Superlogica: invalid publication rule");
            return Err(ValidationError::new("publish", format!("publication rule must be 1 to 4, got {publish}"))
                .with_accepted(["1", "2", "3", "4"])
                .into());
        }

        info!(condominium_id, file_name, "Superlogica: uploading attachment");
        let part = Part::bytes(content).file_name(file_name.to_string());
        let builder = self
            .request(Method::POST, DOCUMENTS_PATH)
            .query(&[("idEmpresa", condominium_id.to_string()), ("publicar", publish.to_string())])
            .multipart(Form::new().part("arquivo", part));
        let body = self.transport.send_json(builder).await?;
        Ok(Outcome::from_response(body))
    }
}

impl Provider for SuperlogicaPayablesClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Payables
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl PayablesClient for SuperlogicaPayablesClient {
    async fn create_payable(&mut self, data: Payload) -> FinbridgeResult<Outcome> {
        if let Err(err) = require_non_empty_fields(&data, REQUIRED_MOVEMENT_FIELDS) {
            error!(field = %err.field, "Superlogica: invalid movement");
            return Err(err.into());
        }

        info!("Superlogica: creating payable");
        let builder = self
            .request(Method::POST, MOVEMENTS_PATH)
            .form(&form_pairs(&data));
        let body = self.transport.send_json(builder).await?;
        Ok(Outcome::from_response(body))
    }

    async fn settle_payable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome> {
        self.post_movement(id, "settle", &details).await
    }

    async fn cancel_payable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome> {
        self.post_movement(id, "cancel", &details).await
    }
}
