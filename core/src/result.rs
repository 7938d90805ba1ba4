//! Normalized API call result with canonical field access.
//!
//! # Design
//! The service names fields in `Pascal_Snake_Case` (sometimes without the
//! underscores). `OrcaResult` builds a lookup table once, from canonical
//! accessor names (`api_result`) to the keys the body actually carries
//! (`Api_Result`), so callers never depend on the exact spelling. Only the
//! body's top-level keys are translated; nested objects keep the service's
//! keys.

use std::collections::{BTreeSet, HashMap};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::envelope::{self, Envelope};
use crate::error::ApiError;

/// Status code for a locked record.
pub const LOCKED: &str = "E90";

/// Extra status codes accepted as success on top of the all-zero codes.
///
/// List-style queries report "nothing found" as an error code; accepting it
/// here turns an empty answer into an ordinary success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessPolicy {
    accepted: BTreeSet<String>,
}

impl SuccessPolicy {
    pub fn accepting(codes: &[&str]) -> Self {
        Self {
            accepted: codes.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    fn accepts(&self, code: &str) -> bool {
        is_zero_code(code) || self.accepted.contains(code)
    }
}

fn is_zero_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b == b'0')
}

/// The outcome of one request/response exchange.
#[derive(Debug, Clone)]
pub struct OrcaResult {
    envelope: Envelope,
    names: HashMap<String, String>,
    policy: SuccessPolicy,
}

impl OrcaResult {
    /// Normalize `raw` and build the field translation table.
    pub fn new(raw: Value) -> Result<Self, ApiError> {
        Self::with_policy(raw, SuccessPolicy::default())
    }

    pub fn with_policy(raw: Value, policy: SuccessPolicy) -> Result<Self, ApiError> {
        let envelope = envelope::normalize(raw)?;
        let names = translation_table(&envelope.body);
        Ok(Self {
            envelope,
            names,
            policy,
        })
    }

    /// Insert `key` into the body unless the service already returned it,
    /// under any spelling with the same canonical name.
    ///
    /// `key` is the service's spelling, e.g. `Lock_Information`.
    pub fn with_default(mut self, key: &str, value: Value) -> Self {
        let canonical = envelope::canonical_name(key);
        if !self.has_field(&canonical) {
            self.names.insert(canonical, key.to_string());
            self.envelope.body.insert(key.to_string(), value);
        }
        self
    }

    /// The status code, or `""` when the body has none.
    pub fn api_result(&self) -> &str {
        self.get_str("api_result").unwrap_or("")
    }

    pub fn api_result_message(&self) -> &str {
        self.get_str("api_result_message").unwrap_or("")
    }

    pub fn succeeded(&self) -> bool {
        self.policy.accepts(self.api_result())
    }

    pub fn locked(&self) -> bool {
        self.api_result() == LOCKED
    }

    /// Message and status code, formatted as `message(code)`.
    pub fn message(&self) -> String {
        format!("{}({})", self.api_result_message(), self.api_result())
    }

    /// Look up a field by canonical name; `None` when the service omitted it.
    pub fn get(&self, canonical: &str) -> Option<&Value> {
        self.names
            .get(canonical)
            .and_then(|key| self.envelope.body.get(key))
    }

    /// Like `get`, but reports absence as `ApiError::FieldNotFound`.
    pub fn field(&self, canonical: &str) -> Result<&Value, ApiError> {
        self.get(canonical)
            .ok_or_else(|| ApiError::FieldNotFound(canonical.to_string()))
    }

    pub fn get_str(&self, canonical: &str) -> Option<&str> {
        self.get(canonical).and_then(Value::as_str)
    }

    /// Whether the body carries a field with this canonical name.
    pub fn has_field(&self, canonical: &str) -> bool {
        self.names.contains_key(canonical)
    }

    /// The envelope's top-level key.
    pub fn request_name(&self) -> &str {
        &self.envelope.name
    }

    /// The untranslated, trimmed body.
    pub fn body(&self) -> &Map<String, Value> {
        &self.envelope.body
    }

    /// The whole normalized envelope, key and body.
    pub fn raw(&self) -> Value {
        self.envelope.to_value()
    }
}

impl Serialize for OrcaResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.envelope.name, &self.envelope.body)?;
        map.end()
    }
}

fn translation_table(body: &Map<String, Value>) -> HashMap<String, String> {
    body.keys()
        .map(|key| (envelope::canonical_name(key), key.clone()))
        .collect()
}
