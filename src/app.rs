use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::openapi::OpenApi as OpenApiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, AppState};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

fn api_routes(api_doc: OpenApiDoc) -> Router<Arc<AppState>> {
    Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/openapi.json", api_doc))
        .route("/lead", post(handlers::create_lead))
        .route("/lead/:id", get(handlers::get_lead))
        .route("/send", post(handlers::send_outreach))
        .route("/reply", post(handlers::handle_reply))
        .route("/ai/reply", post(handlers::generate_ai_reply))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

fn finish(api: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    // Health check bypasses rate limiting
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Full application router without rate limiting.
pub fn router(state: Arc<AppState>, api_doc: OpenApiDoc) -> Router {
    finish(api_routes(api_doc), state)
}

/// Application router with per-IP rate limiting on the API routes.
///
/// Must be served with connect info so the client address can be extracted
/// when no forwarding headers are present.
pub fn rate_limited_router(
    state: Arc<AppState>,
    api_doc: OpenApiDoc,
    per_second: u64,
    burst_size: u32,
) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = api_routes(api_doc).layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));

    Ok(finish(api, state))
}
