//! Response envelope normalization.
//!
//! # Overview
//! Every ORCA response is a JSON object with a single key (the response
//! name, e.g. `medicalv3res7`) wrapping the body object. Repeating groups in
//! the body are emitted at a fixed size, with unused slots filled by empty
//! records. `normalize` unwraps the envelope and strips that padding.
//!
//! # Trimming
//! Only a trailing run of empty elements is dropped from a sequence.
//! Empty elements that precede a non-empty one are gaps the service meant
//! to send and are kept. Emptiness is judged on the element as received;
//! kept objects are then trimmed in turn, other elements are kept as is.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// A response envelope with its padding removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The envelope's single top-level key.
    pub name: String,
    /// The object stored under `name`.
    pub body: Map<String, Value>,
}

impl Envelope {
    /// Rebuild the `{ name: body }` JSON value.
    pub fn to_value(&self) -> Value {
        let mut outer = Map::with_capacity(1);
        outer.insert(self.name.clone(), Value::Object(self.body.clone()));
        Value::Object(outer)
    }
}

/// Unwrap and trim a raw response envelope.
///
/// Fails with `MalformedEnvelope` unless `raw` is an object holding exactly
/// one key whose value is an object.
pub fn normalize(raw: Value) -> Result<Envelope, ApiError> {
    let outer = match raw {
        Value::Object(outer) => outer,
        other => {
            return Err(ApiError::MalformedEnvelope(format!(
                "expected an object, got {}",
                kind(&other)
            )))
        }
    };
    if outer.len() != 1 {
        return Err(ApiError::MalformedEnvelope(format!(
            "expected exactly one top-level key, got {}",
            outer.len()
        )));
    }
    let Some((name, body)) = outer.into_iter().next() else {
        return Err(ApiError::MalformedEnvelope("empty envelope".to_string()));
    };
    match body {
        Value::Object(body) => Ok(Envelope {
            name,
            body: trim_object(body),
        }),
        other => Err(ApiError::MalformedEnvelope(format!(
            "body under {name:?} is {}, expected an object",
            kind(&other)
        ))),
    }
}

/// Drop trailing empty elements from `value` if it is a sequence, and from
/// every sequence reachable through objects.
pub fn trim(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(trim_object(map)),
        Value::Array(items) => Value::Array(trim_array(items)),
        other => other,
    }
}

fn trim_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, trim(v))).collect()
}

fn trim_array(items: Vec<Value>) -> Vec<Value> {
    let mut kept = Vec::with_capacity(items.len());
    let mut found = false;
    for item in items.into_iter().rev() {
        if !is_empty(&item) {
            found = true;
        }
        if found {
            kept.push(match item {
                Value::Object(map) => Value::Object(trim_object(map)),
                other => other,
            });
        }
    }
    kept.reverse();
    kept
}

/// Whether `value` counts as padding.
///
/// Objects, arrays and strings are empty when they have no content; `null`
/// is always empty. Numbers and booleans never are.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Translate a service field name into its canonical accessor name.
///
/// An underscore is inserted before the last capital of an acronym run that
/// starts a new word (`HTTPServer` -> `http_server`) and between a lowercase
/// letter or digit and a following capital (`KarteUid` -> `karte_uid`).
/// Existing underscores are kept, so `Api_Result` and `ApiResult` both map
/// to `api_result`.
pub fn canonical_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let acronym_end = prev.is_ascii_uppercase() && next_is_lower;
            let word_start = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            if acronym_end || word_start {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
