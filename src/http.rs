//! Thin HTTP layer shared by the real backends.
//!
//! Sends exactly one request per call and normalizes the outcome:
//! non-2xx becomes [`FinbridgeError::Transport`], a 2xx body is decoded as JSON
//! (empty body → `null`). Retry and backoff are left to the caller.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{FinbridgeError, FinbridgeResult};

const USER_AGENT: &str = concat!("finbridge/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one provider's base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    provider: &'static str,
}

impl HttpTransport {
    /// Create a transport for `provider` rooted at `base_url`.
    pub fn new(provider: &'static str, base_url: impl Into<String>) -> FinbridgeResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            provider,
        })
    }

    /// Provider name used in logs and errors.
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `path` onto the base URL with exactly one `/` between them.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Start a request against `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request and decode a JSON body.
    pub async fn send_json(&self, builder: RequestBuilder) -> FinbridgeResult<Value> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            error!(provider = self.provider, error = %err, "undecodable response body");
            FinbridgeError::InvalidResponse(format!("{}: {err}", self.provider))
        })
    }

    /// Send a request and return the raw body bytes.
    pub async fn send_bytes(&self, builder: RequestBuilder) -> FinbridgeResult<Vec<u8>> {
        let response = self.send(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send(&self, builder: RequestBuilder) -> FinbridgeResult<Response> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(provider = self.provider, %method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            error!(provider = self.provider, %method, %url, error = %err, "HTTP request failed");
            FinbridgeError::from(err)
        })?;

        let status = response.status();
        debug!(provider = self.provider, %method, %url, %status, "received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                error!(provider = self.provider, status = status.as_u16(), error = %err, "failed to read error response body");
                String::new()
            }
        };
        error!(provider = self.provider, status = status.as_u16(), body = %body, "provider returned error status");
        Err(FinbridgeError::Transport {
            status: status.as_u16(),
            body,
        })
    }
}
