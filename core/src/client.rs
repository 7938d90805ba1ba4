//! Stateless HTTP request builder and response parser for the ORCA API.
//!
//! # Design
//! `OrcaClient` holds only the base URL and the karte UID that identifies
//! this client to the service. Every API call is a JSON `POST` of a
//! single-key request envelope; `build_call` produces that request and
//! `parse_result` turns the reply into an `OrcaResult`. `call` runs both
//! through a host `Transport` for callers that don't need the split.

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::result::{OrcaResult, SuccessPolicy};

/// Synchronous, stateless client for the ORCA API.
#[derive(Debug, Clone)]
pub struct OrcaClient {
    base_url: String,
    karte_uid: String,
}

impl OrcaClient {
    pub fn new(base_url: &str, karte_uid: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            karte_uid: karte_uid.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self::new(config.base_url.trim(), &config.karte_uid))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn karte_uid(&self) -> &str {
        &self.karte_uid
    }

    /// Wrap `body` as `{ request_name: body }` and build a JSON POST to `path`.
    pub fn build_call(
        &self,
        path: &str,
        request_name: &str,
        body: Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        let mut envelope = Map::with_capacity(1);
        envelope.insert(request_name.to_string(), Value::Object(body));
        let body = serde_json::to_string(&envelope)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        debug!(path, request_name, "built request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    /// Check the HTTP status, decode the body and normalize it.
    pub fn parse_result(
        &self,
        response: HttpResponse,
        policy: SuccessPolicy,
    ) -> Result<OrcaResult, ApiError> {
        check_status(&response, 200)?;
        let raw: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        let result = OrcaResult::with_policy(raw, policy)?;
        debug!(
            response_name = result.request_name(),
            api_result = result.api_result(),
            "normalized response"
        );
        Ok(result)
    }

    /// Build, execute and parse one exchange.
    pub fn call<T: Transport>(
        &self,
        transport: &T,
        path: &str,
        request_name: &str,
        body: Map<String, Value>,
        policy: SuccessPolicy,
    ) -> Result<OrcaResult, ApiError> {
        let request = self.build_call(path, request_name, body)?;
        let response = transport.execute(request).map_err(ApiError::transport)?;
        self.parse_result(response, policy)
    }
}

/// Map non-success HTTP status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
