use std::any::Any;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use super::ErpClient;
use crate::config::{CredentialBundle, Settings};
use crate::error::{FinbridgeError, FinbridgeResult, ValidationError, ValidationResult};
use crate::http::HttpTransport;
use crate::payload::{Outcome, Payload};
use crate::provider::{CapabilityFamily, Provider};
use crate::validation::{integer, parse_date, positive_number, required_string};

const BACKEND: &str = "omie";
const ENDPOINT: &str = "financas/contareceber/";
const DEFAULT_BASE_URL: &str = "https://app.omie.com.br/api/v1/";
const SETTLEMENT_NOTE: &str = "Baixa automática via API";
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Omie credentials and endpoint.
#[derive(Debug, Clone)]
pub struct OmieConfig {
    /// `OMIE_APP_KEY`
    pub app_key: String,
    /// `OMIE_APP_SECRET`
    pub app_secret: String,
    /// `OMIE_BASE_URL`
    pub base_url: String,
    /// `OMIE_DEFAULT_ACCOUNT_ID`, used by settlements that omit a checking account
    pub default_account_id: Option<String>,
}

impl CredentialBundle for OmieConfig {
    const BACKEND: &'static str = "Omie";
    const REQUIRED: &'static [&'static str] = &["OMIE_APP_KEY", "OMIE_APP_SECRET"];

    fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        debug!("Omie: loading configuration");
        let mut values = settings.require(Self::BACKEND, Self::REQUIRED)?.into_iter();
        Ok(Self {
            app_key: values.next().unwrap_or_default(),
            app_secret: values.next().unwrap_or_default(),
            base_url: settings.get_or("OMIE_BASE_URL", DEFAULT_BASE_URL).to_string(),
            default_account_id: settings.get("OMIE_DEFAULT_ACCOUNT_ID").map(str::to_string),
        })
    }
}

/// Accounts receivable through the Omie API.
///
/// Every verb is a `POST` to `financas/contareceber/` carrying the
/// `{call, app_key, app_secret, param: [data]}` envelope.
#[derive(Debug)]
pub struct OmieErpClient {
    config: OmieConfig,
    transport: HttpTransport,
}

impl OmieErpClient {
    /// Create a client from a credential bundle.
    pub fn new(config: OmieConfig) -> FinbridgeResult<Self> {
        let transport = HttpTransport::new(BACKEND, config.base_url.clone())?;
        Ok(Self { config, transport })
    }

    /// Create a client from settings.
    pub fn from_settings(settings: &Settings) -> FinbridgeResult<Self> {
        Self::new(OmieConfig::from_settings(settings)?)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &OmieConfig {
        &self.config
    }

    fn envelope(&self, call: &str, data: Map<String, Value>) -> Value {
        json!({
            "call": call,
            "app_key": self.config.app_key,
            "app_secret": self.config.app_secret,
            "param": [data],
        })
    }

    async fn call(&self, call: &str, data: Map<String, Value>) -> FinbridgeResult<Outcome> {
        debug!(call, "Omie: sending call");
        let builder = self
            .transport
            .request(Method::POST, ENDPOINT)
            .json(&self.envelope(call, data));
        let body = self.transport.send_json(builder).await?;

        if let Some(fault) = body.get("faultstring") {
            let message = fault.as_str().map(str::to_string).unwrap_or_else(|| fault.to_string());
            error!(call, fault = %message, "Omie: API fault");
            return Err(FinbridgeError::ProviderLogic {
                provider: BACKEND.to_string(),
                message,
            });
        }

        info!(call, "Omie: call succeeded");
        Ok(Outcome::from_response(body))
    }
}

/// Shape an `IncluirContaReceber` parameter: dates to `DD/MM/YYYY`, identifiers and amount
/// to strings.
fn receivable_param(data: Payload) -> ValidationResult<Map<String, Value>> {
    let customer = integer("codigo_cliente_fornecedor", data.get("codigo_cliente_fornecedor"))?;
    let due = parse_date("data_vencimento", data.get("data_vencimento"))?;
    positive_number("valor_documento", data.get("valor_documento"))?;
    required_string("codigo_categoria", data.get("codigo_categoria"))?;
    let account = integer("id_conta_corrente", data.get("id_conta_corrente"))?;
    let forecast = match data.get("data_previsao") {
        Some(value) if !value.is_null() => Some(parse_date("data_previsao", Some(value))?),
        _ => None,
    };

    let mut param = data.into_map();
    let amount = param
        .get("valor_documento")
        .map(|v| v.to_string())
        .unwrap_or_default();
    param.insert("codigo_cliente_fornecedor".into(), customer.to_string().into());
    param.insert("data_vencimento".into(), due.format(DATE_FORMAT).to_string().into());
    param.insert("valor_documento".into(), amount.into());
    param.insert("id_conta_corrente".into(), account.to_string().into());
    if let Some(forecast) = forecast {
        param.insert("data_previsao".into(), forecast.format(DATE_FORMAT).to_string().into());
    }
    Ok(param)
}

fn lancamento_id(id: &str) -> ValidationResult<i64> {
    integer("id", Some(&Value::from(id)))
}

impl Provider for OmieErpClient {
    fn name(&self) -> &str {
        BACKEND
    }

    fn family(&self) -> CapabilityFamily {
        CapabilityFamily::Erp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl ErpClient for OmieErpClient {
    async fn create_accounts_receivable(&mut self, data: Payload) -> FinbridgeResult<Outcome> {
        let param = receivable_param(data).map_err(|err| {
            error!(field = %err.field, "Omie: invalid receivable");
            err
        })?;
        self.call("IncluirContaReceber", param).await
    }

    async fn update_accounts_receivable(&mut self, id: &str, data: Payload) -> FinbridgeResult<Outcome> {
        let id = lancamento_id(id)?;
        let mut param = Map::new();
        param.insert("codigo_lancamento_omie".into(), id.into());
        param.extend(data.into_map());
        self.call("AlterarContaReceber", param).await
    }

    async fn settle_accounts_receivable(&mut self, id: &str, details: Payload) -> FinbridgeResult<Outcome> {
        let id = lancamento_id(id)?;
        let valor = positive_number("valor", details.get("valor"))?;
        let date = parse_date("data", details.get("data"))?;

        let account = match details.get("codigo_conta_corrente") {
            Some(value) if !value.is_null() => value.clone(),
            _ => match &self.config.default_account_id {
                Some(default) => Value::from(default.as_str()),
                None => {
                    error!("Omie: no checking account for settlement");
                    return Err(ValidationError::new(
                        "codigo_conta_corrente",
                        "no checking account given and OMIE_DEFAULT_ACCOUNT_ID is not set",
                    )
                    .into());
                }
            },
        };
        let note = details
            .get_str("observacao")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(SETTLEMENT_NOTE);

        let mut param = Map::new();
        param.insert("codigo_lancamento".into(), id.into());
        param.insert("codigo_conta_corrente".into(), account);
        param.insert("valor".into(), valor.into());
        param.insert("data".into(), date.format(DATE_FORMAT).to_string().into());
        param.insert("observacao".into(), note.into());
        self.call("LancarRecebimento", param).await
    }

    async fn cancel_accounts_receivable(&mut self, id: &str, _details: Payload) -> FinbridgeResult<Outcome> {
        let id = lancamento_id(id)?;
        let mut param = Map::new();
        param.insert("codigo_lancamento_omie".into(), id.into());
        self.call("CancelarContaReceber", param).await
    }
}
