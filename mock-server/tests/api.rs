use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, now_secs, Lock, LOCK_GROUP_SIZE};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn lock_call(app: &Router, req: Value) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request("/api21/medicalmodv37", json!({"medicalv3req7": req})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["medicalv3res7"].clone()
}

fn old_lock(karte: &str, orca: &str) -> Lock {
    Lock::new(karte, orca, now_secs() - 3600)
}

// --- list ---

#[tokio::test]
async fn list_empty_reports_e10() {
    let body = lock_call(&app(), json!({"Request_Number": "00", "Karte_Uid": "K0"})).await;
    assert_eq!(body["Api_Result"], "E10");
    assert!(body.get("Lock_Information").is_none());
}

#[tokio::test]
async fn list_pads_lock_group() {
    let app = app_with(vec![old_lock("K1", "O1")]);
    let body = lock_call(&app, json!({"Request_Number": "00", "Karte_Uid": "K0"})).await;
    assert_eq!(body["Api_Result"], "000");
    let group = body["Lock_Information"].as_array().unwrap();
    assert_eq!(group.len(), LOCK_GROUP_SIZE);
    assert_eq!(group[0]["Orca_Uid"], "O1");
    assert_eq!(group[1], json!({}));
}

// --- unlock ---

#[tokio::test]
async fn unlock_requires_confirmation() {
    let app = app_with(vec![old_lock("K1", "O1"), old_lock("K2", "O2")]);
    let first = lock_call(
        &app,
        json!({
            "Request_Number": "01",
            "Karte_Uid": "K0",
            "Delete_Information": {"Delete_Karte_Uid": "K1", "Delete_Orca_Uid": "O1"}
        }),
    )
    .await;
    assert_eq!(first["Api_Result"], "S40");
    assert_eq!(first["Response_Number"], "02");

    let second = lock_call(
        &app,
        json!({
            "Request_Number": first["Response_Number"],
            "Karte_Uid": first["Karte_Uid"],
            "Orca_Uid": first["Orca_Uid"],
            "Delete_Information": first["Delete_Information"],
            "Select_Answer": "Ok"
        }),
    )
    .await;
    assert_eq!(second["Api_Result"], "000");

    let list = lock_call(&app, json!({"Request_Number": "00"})).await;
    assert_eq!(list["Lock_Information"][0]["Karte_Uid"], "K2");
    assert_eq!(list["Lock_Information"][1], json!({}));
}

#[tokio::test]
async fn unlock_recent_lock_reports_e14() {
    let app = app_with(vec![Lock::new("K1", "O1", now_secs())]);
    let body = lock_call(
        &app,
        json!({
            "Request_Number": "01",
            "Delete_Information": {"Delete_Karte_Uid": "K1", "Delete_Orca_Uid": "O1"}
        }),
    )
    .await;
    assert_eq!(body["Api_Result"], "E14");
}

#[tokio::test]
async fn unlock_unknown_lock_reports_e13() {
    let body = lock_call(
        &app(),
        json!({"Request_Number": "01", "Delete_Information": {"Delete_Class": "All"}}),
    )
    .await;
    assert_eq!(body["Api_Result"], "E13");
}

#[tokio::test]
async fn confirmation_without_ok_is_refused() {
    let app = app_with(vec![old_lock("K1", "O1")]);
    let body = lock_call(&app, json!({"Request_Number": "02", "Orca_Uid": "x"})).await;
    assert_eq!(body["Api_Result"], "E15");
}

#[tokio::test]
async fn missing_request_name_returns_400() {
    let resp = app()
        .oneshot(json_request("/api21/medicalmodv37", json!({"other": {}})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- physician ---

#[tokio::test]
async fn physician_list_echoes_base_date() {
    let resp = app()
        .oneshot(json_request(
            "/api01rv2/system01lstv2",
            json!({"system01_managereq": {"Request_Number": "02", "Base_Date": "2026-10-16"}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["system01_managereq"]["Base_Date"], "2026-10-16");
    assert_eq!(body["system01_managereq"]["Api_Result"], "00");
}
