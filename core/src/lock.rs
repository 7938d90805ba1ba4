//! Listing and releasing the service's exclusive locks.
//!
//! # Overview
//! Releasing a lock takes up to two exchanges. The delete request (`01`)
//! either settles immediately, or the service answers `S40` to say it found
//! a match and wants the deletion confirmed. The confirmation echoes four
//! fields from that answer and adds `Select_Answer = "Ok"`.
//!
//! # Design
//! `UnlockFlow` is the protocol as a sans-IO state machine: the host feeds
//! it responses and gets back either the next request to send or the final
//! result. `LockService` drives a flow through a `Transport`. Neither retries:
//! `E14` (lock too recent, retry after a minute) comes back as an ordinary
//! result for the caller to act on.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::client::OrcaClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::result::{OrcaResult, SuccessPolicy};

pub const PATH: &str = "/api21/medicalmodv37";
pub const REQUEST_NAME: &str = "medicalv3req7";

/// List query found no locks.
pub const NOT_FOUND: &str = "E10";
/// The lock was taken less than a minute ago and may belong to a live terminal.
pub const TOO_RECENT: &str = "E14";
/// A match was found; the deletion must be confirmed.
pub const CONFIRM_REQUIRED: &str = "S40";

const LOCK_INFORMATION: &str = "Lock_Information";

/// One element of a list result's `lock_information` field.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LockEntry {
    #[serde(rename = "Karte_Uid", default)]
    pub karte_uid: Option<String>,
    #[serde(rename = "Orca_Uid", default)]
    pub orca_uid: Option<String>,
    #[serde(rename = "Lock_Date", default)]
    pub lock_date: Option<String>,
    #[serde(rename = "Lock_Time", default)]
    pub lock_time: Option<String>,
    #[serde(rename = "Lock_Program_Name", default)]
    pub program_name: Option<String>,
    #[serde(rename = "Lock_Operator", default)]
    pub operator: Option<String>,
}

/// Decode the `lock_information` field of a list result.
pub fn lock_entries(result: &OrcaResult) -> Result<Vec<LockEntry>, ApiError> {
    let value = result.field("lock_information")?;
    serde_json::from_value(value.clone()).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

pub fn build_list(client: &OrcaClient) -> Result<HttpRequest, ApiError> {
    let body = object(json!({
        "Request_Number": "00",
        "Karte_Uid": client.karte_uid(),
    }));
    client.build_call(PATH, REQUEST_NAME, body)
}

/// Parse a list reply. `E10` counts as success and `lock_information` is
/// always present, empty when the service returned none.
pub fn parse_list(client: &OrcaClient, response: HttpResponse) -> Result<OrcaResult, ApiError> {
    let result = client.parse_result(response, SuccessPolicy::accepting(&[NOT_FOUND]))?;
    Ok(result.with_default(LOCK_INFORMATION, Value::Array(Vec::new())))
}

fn unlock_request(client: &OrcaClient, delete_information: Value) -> Map<String, Value> {
    object(json!({
        "Request_Number": "01",
        "Karte_Uid": client.karte_uid(),
        "Delete_Information": delete_information,
    }))
}

fn confirm_request(first: &OrcaResult) -> Map<String, Value> {
    let echo = |name: &str| first.get(name).cloned().unwrap_or(Value::Null);
    object(json!({
        "Request_Number": echo("response_number"),
        "Karte_Uid": echo("karte_uid"),
        "Orca_Uid": echo("orca_uid"),
        "Delete_Information": echo("delete_information"),
        "Select_Answer": "Ok",
    }))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Where an unlock exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    Init,
    Requested,
    ConfirmNeeded,
    Confirmed,
    Done,
}

/// What the host should do after feeding a response to an `UnlockFlow`.
#[derive(Debug)]
pub enum UnlockStep {
    /// Send this confirmation request and feed its response back.
    Send(HttpRequest),
    /// The exchange is over; this is the final result.
    Done(OrcaResult),
}

/// One lock-release exchange, without I/O.
#[derive(Debug)]
pub struct UnlockFlow<'a> {
    client: &'a OrcaClient,
    request: Map<String, Value>,
    state: UnlockState,
}

impl<'a> UnlockFlow<'a> {
    /// Release the lock held for `karte_uid` / `orca_uid`.
    pub fn one(client: &'a OrcaClient, karte_uid: &str, orca_uid: &str) -> Self {
        let scope = json!({
            "Delete_Karte_Uid": karte_uid,
            "Delete_Orca_Uid": orca_uid,
        });
        Self::with_scope(client, scope)
    }

    /// Release every lock.
    pub fn all(client: &'a OrcaClient) -> Self {
        Self::with_scope(client, json!({"Delete_Class": "All"}))
    }

    fn with_scope(client: &'a OrcaClient, scope: Value) -> Self {
        Self {
            client,
            request: unlock_request(client, scope),
            state: UnlockState::Init,
        }
    }

    pub fn state(&self) -> UnlockState {
        self.state
    }

    /// Build the delete request. Valid once, from `Init`.
    pub fn start(&mut self) -> Result<HttpRequest, ApiError> {
        if self.state != UnlockState::Init {
            return Err(ApiError::InvalidState("unlock flow already started"));
        }
        let request = self
            .client
            .build_call(PATH, REQUEST_NAME, std::mem::take(&mut self.request))?;
        self.transition(UnlockState::Requested, "");
        Ok(request)
    }

    /// Feed the response to the last request sent.
    pub fn handle(&mut self, response: HttpResponse) -> Result<UnlockStep, ApiError> {
        match self.state {
            UnlockState::Requested => {
                let first = self.client.parse_result(response, SuccessPolicy::default())?;
                if first.api_result() != CONFIRM_REQUIRED {
                    return Ok(UnlockStep::Done(self.finish(first)));
                }
                let confirm = confirm_request(&first);
                let request = self.client.build_call(PATH, REQUEST_NAME, confirm)?;
                self.transition(UnlockState::ConfirmNeeded, first.api_result());
                Ok(UnlockStep::Send(request))
            }
            UnlockState::ConfirmNeeded => {
                let second = self.client.parse_result(response, SuccessPolicy::default())?;
                self.transition(UnlockState::Confirmed, second.api_result());
                Ok(UnlockStep::Done(self.finish(second)))
            }
            UnlockState::Init => Err(ApiError::InvalidState("unlock flow not started")),
            UnlockState::Confirmed | UnlockState::Done => {
                Err(ApiError::InvalidState("unlock flow already finished"))
            }
        }
    }

    fn finish(&mut self, result: OrcaResult) -> OrcaResult {
        self.transition(UnlockState::Done, result.api_result());
        if !result.succeeded() {
            warn!(api_result = result.api_result(), message = %result.message(), "unlock not completed");
        }
        result
    }

    /// `api_result` is the status code that caused the move, `""` before any reply.
    fn transition(&mut self, next: UnlockState, api_result: &str) {
        info!(from = ?self.state, to = ?next, api_result, "unlock state");
        self.state = next;
    }
}

/// Lock listing and release over a host transport.
#[derive(Debug)]
pub struct LockService<'a, T> {
    client: &'a OrcaClient,
    transport: &'a T,
}

impl<'a, T: Transport> LockService<'a, T> {
    pub fn new(client: &'a OrcaClient, transport: &'a T) -> Self {
        Self { client, transport }
    }

    /// List the locks currently held.
    pub fn list(&self) -> Result<OrcaResult, ApiError> {
        let response = self.execute(build_list(self.client)?)?;
        parse_list(self.client, response)
    }

    /// Release one lock, taken from a `list` entry's karte and orca UIDs.
    pub fn unlock(&self, karte_uid: &str, orca_uid: &str) -> Result<OrcaResult, ApiError> {
        self.drive(UnlockFlow::one(self.client, karte_uid, orca_uid))
    }

    /// Release every lock.
    pub fn unlock_all(&self) -> Result<OrcaResult, ApiError> {
        self.drive(UnlockFlow::all(self.client))
    }

    fn drive(&self, mut flow: UnlockFlow<'_>) -> Result<OrcaResult, ApiError> {
        let mut request = flow.start()?;
        loop {
            let response = self.execute(request)?;
            match flow.handle(response)? {
                UnlockStep::Send(next) => request = next,
                UnlockStep::Done(result) => return Ok(result),
            }
        }
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request).map_err(ApiError::transport)
    }
}
