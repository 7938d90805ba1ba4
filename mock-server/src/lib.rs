use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Repeating groups are always sent with this many slots.
pub const LOCK_GROUP_SIZE: usize = 5;

/// Locks younger than this many seconds are refused with `E14`.
pub const MIN_LOCK_AGE_SECS: u64 = 60;

/// Unconfirmed deletions are forgotten after this many seconds.
pub const PENDING_TTL_SECS: u64 = 300;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lock {
    #[serde(rename = "Karte_Uid")]
    pub karte_uid: String,
    #[serde(rename = "Orca_Uid")]
    pub orca_uid: String,
    #[serde(rename = "Lock_Date")]
    pub lock_date: String,
    #[serde(rename = "Lock_Time")]
    pub lock_time: String,
    #[serde(rename = "Lock_Program_Name")]
    pub program_name: String,
    #[serde(rename = "Lock_Operator")]
    pub operator: String,
    /// Unix seconds when the lock was taken.
    #[serde(skip)]
    pub locked_at: u64,
}

impl Lock {
    pub fn new(karte_uid: &str, orca_uid: &str, locked_at: u64) -> Self {
        Self {
            karte_uid: karte_uid.to_string(),
            orca_uid: orca_uid.to_string(),
            lock_date: "2026-10-16".to_string(),
            lock_time: "09:00:00".to_string(),
            program_name: "medical".to_string(),
            operator: "ormaster".to_string(),
            locked_at,
        }
    }
}

/// A deletion answered with `S40`, waiting for `Select_Answer = "Ok"`.
#[derive(Debug, Clone)]
struct Pending {
    scope: Value,
    issued_at: u64,
}

#[derive(Debug, Default)]
pub struct Locks {
    held: Vec<Lock>,
    /// By operation id.
    pending: HashMap<String, Pending>,
}

impl Locks {
    /// Drop deletions that were never confirmed within `PENDING_TTL_SECS`.
    fn expire_pending(&mut self, now: u64) {
        self.pending
            .retain(|_, p| now.saturating_sub(p.issued_at) < PENDING_TTL_SECS);
    }
}

pub type Db = Arc<RwLock<Locks>>;

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(locks: Vec<Lock>) -> Router {
    let db: Db = Arc::new(RwLock::new(Locks {
        held: locks,
        pending: HashMap::new(),
    }));
    Router::new()
        .route("/api21/medicalmodv37", post(medicalmod))
        .route("/api01rv2/system01lstv2", post(system_list))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, locks: Vec<Lock>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(locks)).await
}

fn envelope(name: &str, body: Value) -> Json<Value> {
    Json(json!({ name: body }))
}

fn status(code: &str, message: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("Api_Result".into(), json!(code));
    body.insert("Api_Result_Message".into(), json!(message));
    body
}

fn text<'a>(req: &'a Value, key: &str) -> &'a str {
    req.get(key).and_then(Value::as_str).unwrap_or("")
}

async fn medicalmod(
    State(db): State<Db>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let req = payload.get("medicalv3req7").ok_or(StatusCode::BAD_REQUEST)?;
    let number = text(req, "Request_Number");
    info!(request_number = number, "medicalmodv37");
    let body = match number {
        "00" => list_locks(&db, req).await,
        "01" => request_delete(&db, req).await,
        "02" => confirm_delete(&db, req).await,
        _ => status("E01", "unknown request number"),
    };
    Ok(envelope("medicalv3res7", Value::Object(body)))
}

async fn list_locks(db: &Db, req: &Value) -> Map<String, Value> {
    let locks = db.read().await;
    if locks.held.is_empty() {
        let mut body = status("E10", "no lock information");
        body.insert("Karte_Uid".into(), json!(text(req, "Karte_Uid")));
        return body;
    }
    let mut group: Vec<Value> = locks
        .held
        .iter()
        .map(|l| serde_json::to_value(l).unwrap_or(Value::Null))
        .collect();
    while group.len() < LOCK_GROUP_SIZE {
        group.push(json!({}));
    }
    let mut body = status("000", "processed");
    body.insert("Karte_Uid".into(), json!(text(req, "Karte_Uid")));
    body.insert("Lock_Information".into(), Value::Array(group));
    body
}

fn targets(locks: &[Lock], scope: &Value) -> Vec<usize> {
    if text(scope, "Delete_Class") == "All" {
        return (0..locks.len()).collect();
    }
    let karte = text(scope, "Delete_Karte_Uid");
    let orca = text(scope, "Delete_Orca_Uid");
    locks
        .iter()
        .enumerate()
        .filter(|(_, l)| l.karte_uid == karte && l.orca_uid == orca)
        .map(|(i, _)| i)
        .collect()
}

async fn request_delete(db: &Db, req: &Value) -> Map<String, Value> {
    let scope = req.get("Delete_Information").cloned().unwrap_or(Value::Null);
    let mut locks = db.write().await;
    let now = now_secs();
    locks.expire_pending(now);
    let found = targets(&locks.held, &scope);
    if found.is_empty() {
        return status("E13", "no matching lock");
    }
    if found
        .iter()
        .any(|&i| now.saturating_sub(locks.held[i].locked_at) < MIN_LOCK_AGE_SECS)
    {
        return status("E14", "lock time suggests the terminal is still open");
    }
    let op = Uuid::new_v4().to_string();
    locks.pending.insert(
        op.clone(),
        Pending {
            scope: scope.clone(),
            issued_at: now,
        },
    );
    let mut body = status("S40", "confirm deletion");
    body.insert("Request_Number".into(), json!("01"));
    body.insert("Response_Number".into(), json!("02"));
    body.insert("Karte_Uid".into(), json!(text(req, "Karte_Uid")));
    body.insert("Orca_Uid".into(), json!(op));
    body.insert("Delete_Information".into(), scope);
    body
}

async fn confirm_delete(db: &Db, req: &Value) -> Map<String, Value> {
    if text(req, "Select_Answer") != "Ok" {
        return status("E15", "deletion not confirmed");
    }
    let mut locks = db.write().await;
    locks.expire_pending(now_secs());
    let Some(Pending { scope, .. }) = locks.pending.remove(text(req, "Orca_Uid")) else {
        return status("E13", "no pending deletion");
    };
    let found = targets(&locks.held, &scope);
    let mut i = 0;
    locks.held.retain(|_| {
        let keep = !found.contains(&i);
        i += 1;
        keep
    });
    info!(released = found.len(), "locks released");
    status("000", "processed")
}

async fn system_list(Json(payload): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let req = payload.get("system01_managereq").ok_or(StatusCode::BAD_REQUEST)?;
    let mut body = status("00", "processed");
    body.insert("Request_Number".into(), json!(text(req, "Request_Number")));
    body.insert("Base_Date".into(), json!(text(req, "Base_Date")));
    body.insert(
        "Physician_Information".into(),
        json!([
            {"Code": "10001", "WholeName": "Doctor A"},
            {"Code": "10002", "WholeName": "Doctor B"},
            {},
            {}
        ]),
    );
    Ok(envelope("system01_managereq", Value::Object(body)))
}
