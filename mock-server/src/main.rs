use mock_server::{now_secs, Lock};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    // One releasable lock and one too recent to release.
    let now = now_secs();
    let locks = vec![
        Lock::new("demo-karte", "demo-orca-1", now.saturating_sub(3600)),
        Lock::new("demo-karte", "demo-orca-2", now),
    ];
    info!(%addr, "listening");
    mock_server::run_with(listener, locks).await
}
