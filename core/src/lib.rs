//! Synchronous client core for the ORCA medical-records API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Every reply is normalized
//! into an `OrcaResult`: the single-key envelope is unwrapped, padding
//! records are trimmed from repeating groups, and fields are reachable by
//! canonical snake_case names.
//!
//! # Design
//! - `OrcaClient` is stateless; it holds the base URL and its karte UID.
//! - Status codes from the service are data on `OrcaResult`, never errors.
//!   `ApiError` covers transport, HTTP and envelope failures only.
//! - Multi-step exchanges (lock release) are sans-IO state machines, with
//!   a `Transport`-driven wrapper for hosts that want a single call.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod lock;
pub mod physician;
pub mod result;

pub use client::OrcaClient;
pub use config::ClientConfig;
pub use envelope::{canonical_name, normalize, Envelope};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use lock::{LockEntry, LockService, UnlockFlow, UnlockState, UnlockStep};
pub use physician::PhysicianService;
pub use result::{OrcaResult, SuccessPolicy};
