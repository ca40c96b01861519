/// Rate limiting tests
/// Serves the production router (with the per-IP governor) on an ephemeral port
use reqwest::StatusCode;
use salespad_outreach_api::ai_service::AiService;
use salespad_outreach_api::app;
use salespad_outreach_api::handlers::AppState;
use salespad_outreach_api::lead_service::LeadService;
use salespad_outreach_api::memory_store::InMemoryLeadStore;
use salespad_outreach_api::openapi;
use salespad_outreach_api::queue_service::{QueueService, QueueSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_limited(per_second: u64, burst_size: u32) -> (String, tokio::task::JoinHandle<()>) {
    let state = Arc::new(AppState {
        leads: LeadService::new(Arc::new(InMemoryLeadStore::new())),
        queue: QueueService::new(QueueSettings {
            max_retries: 3,
            process_delay: Duration::from_millis(1),
            retry_backoff: Duration::from_millis(1),
            failure_rate: 0.0,
        }),
        ai: AiService::new(Duration::ZERO),
    });
    let app = app::rate_limited_router(
        state,
        openapi::api_doc("http://localhost:3000"),
        per_second,
        burst_size,
    )
    .expect("valid rate limiter configuration");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://{}", addr), handle)
}

async fn burst(client: &reqwest::Client, url: &str, count: usize) -> Vec<StatusCode> {
    let mut statuses = Vec::with_capacity(count);
    for _ in 0..count {
        statuses.push(client.get(url).send().await.unwrap().status());
    }
    statuses
}

#[tokio::test]
async fn api_routes_are_limited_per_client() {
    let (base_url, handle) = spawn_limited(1, 1).await;
    let client = reqwest::Client::new();

    let statuses = burst(
        &client,
        &format!("{}/lead/5f0c6a8e-2a4b-4d7e-9a1c-3b2f1e0d9c8b", base_url),
        5,
    )
    .await;

    assert_eq!(statuses[0], StatusCode::NOT_FOUND);
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    handle.abort();
}

#[tokio::test]
async fn health_is_never_limited() {
    let (base_url, handle) = spawn_limited(1, 1).await;
    let client = reqwest::Client::new();

    let statuses = burst(&client, &format!("{}/health", base_url), 5).await;

    assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{:?}", statuses);

    handle.abort();
}
