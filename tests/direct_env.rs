//! Kept in its own test binary, the proxy environment variables would leak into other tests

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use southseas::{Client, DirectTransport, RetryPolicy};

async fn spawn(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    addr
}

#[tokio::test]
async fn direct_transport_ignores_proxy_environment() {
    let relay_hits = Arc::new(AtomicU32::new(0));
    let relay = Router::new()
        .fallback(|State(hits): State<Arc<AtomicU32>>| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::FORBIDDEN
        })
        .with_state(relay_hits.clone());
    let relay_addr = spawn(relay).await;

    let api = Router::new().route(
        "/stats/:item",
        get(|| async { Json(json!({"2025-11-17T10:00:00": {"min_buy": 500}})).into_response() }),
    );
    let api_addr = spawn(api).await;

    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::set_var(var, format!("http://{relay_addr}"));
    }
    for var in ["NO_PROXY", "no_proxy"] {
        std::env::remove_var(var);
    }

    let transport = DirectTransport::new(Duration::from_secs(5), "southseas-test").unwrap();
    let client = Client::new(
        Arc::new(transport),
        format!("http://{api_addr}/stats"),
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
    );

    let series = client.try_fetch_series(1).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(relay_hits.load(Ordering::SeqCst), 0);
}
