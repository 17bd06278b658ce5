//! In-memory building blocks shared by the mock backends.
//!
//! A mock backend owns one [`RecordTable`] and one [`MockToken`]. Neither is locked:
//! mutating verbs take `&mut self`, so one mock instance serves one caller at a time.

use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::{Map, Value};

use crate::config::{Settings, MOCK_REQUIRE_TOKEN_KEY};
use crate::error::{FinbridgeError, FinbridgeResult};
use crate::payload::Payload;

/// Payload key carrying a caller-supplied token.
pub const TOKEN_FIELD: &str = "token";

/// How a mock backend treats tokens on mutating verbs.
///
/// One policy per instance, applied to every mutating verb of that instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// The backend issues and checks its own token; callers never pass one.
    #[default]
    Implicit,
    /// Every mutating verb must carry the issued token under `"token"`.
    CallerSupplied,
}

impl TokenPolicy {
    /// Policy selected by `MOCK_REQUIRE_TOKEN`.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.flag(MOCK_REQUIRE_TOKEN_KEY) {
            TokenPolicy::CallerSupplied
        } else {
            TokenPolicy::Implicit
        }
    }
}

/// A synthetic session token derived from a configured key.
///
/// Created on first access, then cached for the life of the instance.
#[derive(Debug, Clone)]
pub struct MockToken {
    backend: &'static str,
    prefix: &'static str,
    key: String,
    suffix_len: usize,
    policy: TokenPolicy,
    issued: Option<String>,
}

impl MockToken {
    /// Create a token source: `<prefix>-<last suffix_len chars of key>`.
    pub fn new(
        backend: &'static str,
        prefix: &'static str,
        key: impl Into<String>,
        suffix_len: usize,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            backend,
            prefix,
            key: key.into(),
            suffix_len,
            policy,
            issued: None,
        }
    }

    /// The active policy.
    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Change the policy.
    pub fn set_policy(&mut self, policy: TokenPolicy) {
        self.policy = policy;
    }

    /// Issue the token on first call; return the cached one afterwards.
    pub fn issue(&mut self) -> &str {
        if self.issued.is_none() {
            let chars: Vec<char> = self.key.chars().collect();
            let start = chars.len().saturating_sub(self.suffix_len);
            let suffix: String = chars[start..].iter().collect();
            let token = format!("{}-{}", self.prefix, suffix);
            tracing::info!(backend = self.backend, token = %token, "mock token issued");
            self.issued = Some(token);
        }
        self.issued.as_deref().unwrap_or_default()
    }

    /// Check a mutating call against the policy and strip the token from the payload.
    pub fn authorize(&mut self, payload: &mut Payload) -> FinbridgeResult<()> {
        let supplied = payload.remove(TOKEN_FIELD);
        let backend = self.backend;
        let expected = self.issue().to_string();

        match self.policy {
            TokenPolicy::Implicit => {
                tracing::debug!(backend, "validating internal token");
                Ok(())
            }
            TokenPolicy::CallerSupplied => {
                let supplied = supplied.as_ref().and_then(Value::as_str);
                tracing::debug!(backend, supplied = ?supplied, "validating caller token");
                if supplied == Some(expected.as_str()) {
                    Ok(())
                } else {
                    tracing::error!(backend, "token missing or invalid");
                    Err(FinbridgeError::InvalidToken {
                        backend: backend.to_string(),
                    })
                }
            }
        }
    }
}

/// A stored record: its fields plus a lifecycle status.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<S> {
    /// Allocated identifier
    pub id: String,
    /// Stored fields (never contains `id`, `status` or `token`)
    pub fields: Map<String, Value>,
    /// Current lifecycle status
    pub status: S,
}

/// Keys that callers cannot overwrite through payload merges.
const RESERVED_FIELDS: &[&str] = &["id", "status", TOKEN_FIELD];

/// An insertion-ordered table with sequential `<prefix>-<n>` ids.
#[derive(Debug, Clone)]
pub struct RecordTable<S> {
    prefix: &'static str,
    records: HashMap<String, Record<S>>,
    ordered: Vec<String>,
}

impl<S: Copy + Debug> RecordTable<S> {
    /// Create an empty table.
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            records: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// Store a record and return its id (`n` = current size + 1).
    pub fn insert(&mut self, payload: Payload, status: S) -> String {
        let id = format!("{}-{}", self.prefix, self.ordered.len() + 1);
        let mut fields = payload.into_map();
        for key in RESERVED_FIELDS {
            fields.remove(*key);
        }
        self.ordered.push(id.clone());
        self.records.insert(
            id.clone(),
            Record {
                id: id.clone(),
                fields,
                status,
            },
        );
        id
    }

    /// Look up a record.
    pub fn get(&self, id: &str) -> Option<&Record<S>> {
        self.records.get(id)
    }

    /// Current status of a record.
    pub fn status(&self, id: &str) -> Option<S> {
        self.records.get(id).map(|r| r.status)
    }

    /// Set a record's status; `false` when the id is unknown.
    pub fn set_status(&mut self, id: &str, status: S) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Merge payload fields into a record; `false` when the id is unknown.
    pub fn merge(&mut self, id: &str, payload: Payload) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                for (key, value) in payload.into_map() {
                    if !RESERVED_FIELDS.contains(&key.as_str()) {
                        record.fields.insert(key, value);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Ids in creation order.
    pub fn ids(&self) -> Vec<&str> {
        self.ordered.iter().map(String::as_str).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
