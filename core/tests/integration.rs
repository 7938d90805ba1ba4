//! Lock listing and release against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives `LockService` and
//! `PhysicianService` over real HTTP through a ureq-backed `Transport`.

use mock_server::{now_secs, Lock};
use orca_core::lock::{lock_entries, TOO_RECENT};
use orca_core::{
    HttpMethod, HttpRequest, HttpResponse, LockService, OrcaClient, PhysicianService, Transport,
};

/// Executes requests with ureq, returning 4xx/5xx as data.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    type Error = ureq::Error;

    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, Self::Error> {
        let mut response = match (req.method, req.body) {
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&req.path).send_empty(),
        }?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Serve the mock on a random port in a background thread.
fn start_server(locks: Vec<Lock>) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, locks).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn unlock_lifecycle() {
    let now = now_secs();
    let base = start_server(vec![
        Lock::new("K1", "O1", now - 3600),
        Lock::new("K2", "O2", now),
    ]);
    let client = OrcaClient::new(&base, "K0");
    let transport = UreqTransport::new();
    let locks = LockService::new(&client, &transport);

    // Step 1: list, padding stripped.
    let res = locks.list().unwrap();
    assert!(res.succeeded(), "{}", res.message());
    let entries = lock_entries(&res).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].orca_uid.as_deref(), Some("O1"));

    // Step 2: the fresh lock is refused, no confirmation attempted.
    let res = locks.unlock("K2", "O2").unwrap();
    assert_eq!(res.api_result(), TOO_RECENT);
    assert!(!res.succeeded());

    // Step 3: the old lock goes through the confirmation step.
    let res = locks.unlock("K1", "O1").unwrap();
    assert!(res.succeeded(), "{}", res.message());

    // Step 4: one lock left.
    let res = locks.list().unwrap();
    let entries = lock_entries(&res).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].karte_uid.as_deref(), Some("K2"));

    // Step 5: unlock_all is blocked by the recent lock.
    let res = locks.unlock_all().unwrap();
    assert_eq!(res.api_result(), TOO_RECENT);
}

#[test]
fn unlock_all_then_empty_list() {
    let now = now_secs();
    let base = start_server(vec![
        Lock::new("K1", "O1", now - 3600),
        Lock::new("K2", "O2", now - 7200),
    ]);
    let client = OrcaClient::new(&base, "K0");
    let transport = UreqTransport::new();
    let locks = LockService::new(&client, &transport);

    let res = locks.unlock_all().unwrap();
    assert!(res.succeeded(), "{}", res.message());

    let res = locks.list().unwrap();
    assert!(res.succeeded());
    assert_eq!(res.api_result(), "E10");
    assert!(lock_entries(&res).unwrap().is_empty());
}

#[test]
fn physician_roster() {
    let base = start_server(Vec::new());
    let client = OrcaClient::new(&base, "K0");
    let transport = UreqTransport::new();

    let res = PhysicianService::new(&client, &transport).list("").unwrap();
    assert!(res.succeeded());
    let roster = res.field("physician_information").unwrap().as_array().unwrap();
    assert_eq!(roster.len(), 2);
}
