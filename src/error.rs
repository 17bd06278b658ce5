//! Error types for Finbridge.

use std::fmt;

use thiserror::Error;

use crate::provider::CapabilityFamily;

/// Root error type for every capability verb and factory call.
#[derive(Error, Debug)]
pub enum FinbridgeError {
    /// A required credential or URL was absent when the backend was constructed.
    #[error("Missing configuration for {backend}: {}", .keys.join(", "))]
    MissingConfiguration {
        /// Backend that failed to construct
        backend: String,
        /// Every missing key, in the order the backend requires them
        keys: Vec<String>,
    },

    /// The selector names a backend that is not registered for the family.
    #[error("{family} client '{selector}' is not supported")]
    UnsupportedProvider {
        /// Family being resolved
        family: CapabilityFamily,
        /// The unrecognized selector value
        selector: String,
    },

    /// The payload failed a field rule; no request was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Caller-supplied token is absent or does not match the issued one.
    #[error("Invalid token for {backend}")]
    InvalidToken {
        /// Backend that rejected the token
        backend: String,
    },

    /// The provider answered with a non-2xx status.
    #[error("Transport error: HTTP {status} - {body}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The provider answered 2xx but embedded an application-level fault.
    #[error("{provider} rejected the request: {message}")]
    ProviderLogic {
        /// Provider that reported the fault
        provider: String,
        /// Fault message as reported by the provider
        message: String,
    },

    /// The request never produced a response (connect, DNS, TLS, body build).
    #[error("Request failed: {0}")]
    Request(String),

    /// A 2xx response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend does not offer this optional verb.
    #[error("{backend} does not support {operation}")]
    NotSupported {
        /// Backend name
        backend: String,
        /// Verb that was invoked
        operation: String,
    },
}

impl FinbridgeError {
    /// Build a `MissingConfiguration` error.
    pub fn missing_configuration<I, S>(backend: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FinbridgeError::MissingConfiguration {
            backend: backend.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a `NotSupported` error.
    pub fn not_supported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        FinbridgeError::NotSupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// Returns the validation details if this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            FinbridgeError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FinbridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FinbridgeError::InvalidResponse(err.to_string())
        } else {
            FinbridgeError::Request(err.to_string())
        }
    }
}

/// A payload rule failure, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field name
    pub field: String,
    /// Human-readable description
    pub message: String,
    /// Accepted values for enum rules; empty otherwise
    pub accepted: Vec<String>,
}

impl ValidationError {
    /// Create a validation error without an accepted-value set.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            accepted: Vec::new(),
        }
    }

    /// Error for a required field that is absent.
    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("required field '{field}' is missing"))
    }

    /// Attach the set of accepted values.
    pub fn with_accepted<I, S>(mut self, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted = accepted.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.accepted.is_empty() {
            write!(f, " (accepted: {})", self.accepted.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Result type alias for Finbridge operations.
pub type FinbridgeResult<T> = Result<T, FinbridgeError>;

/// Result type alias for pure validation helpers.
pub type ValidationResult<T> = Result<T, ValidationError>;
