use crate::ai_service::AiService;
use crate::errors::AppError;
use crate::lead_service::LeadService;
use crate::models::*;
use crate::queue_service::QueueService;
use axum::{
    extract::{FromRequest, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_OUTREACH_CONTENT: &str = "Hello! Interested in SalesPad?";
const DEFAULT_AI_PROMPT: &str = "Follow up";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead persistence and event logging.
    pub leads: LeadService,
    /// Simulated background job queue.
    pub queue: QueueService,
    /// Stubbed reply generator.
    pub ai: AiService,
}

/// `Json` extractor whose rejections render as [`AppError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Service is up."))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /lead
///
/// Creates a new lead. Requires a name and at least one contact method.
///
/// # Returns
///
/// `201 Created` with the stored lead in status `NEW`.
#[utoipa::path(
    post,
    path = "/lead",
    tag = "Leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "The created lead.", body = Lead),
        (status = 400, description = "Missing required fields (Name and at least one contact method).", body = ErrorResponse),
        (status = 500, description = "Internal Server Error.", body = ErrorResponse)
    )
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let new_lead = payload.validate()?;
    tracing::info!("POST /lead - name: {}", new_lead.name);

    let lead = state.leads.create_lead(new_lead).await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

/// POST /send
///
/// Records an outbound message, marks the lead as outreached and enqueues
/// a `SEND_EMAIL` job.
///
/// # Arguments
///
/// * `payload` - `leadId` (required) and an optional `content`. Missing or
///   empty content is stored as the default greeting.
///
/// # Returns
///
/// The confirmation message and the id of the enqueued job. The job keeps
/// processing after the response is sent.
#[utoipa::path(
    post,
    path = "/send",
    tag = "Outreach",
    request_body = SendOutreachRequest,
    responses(
        (status = 200, description = "Message enqueued for sending.", body = OutreachResponse),
        (status = 400, description = "Validation Error (Missing leadId).", body = ErrorResponse),
        (status = 404, description = "Lead not found.", body = ErrorResponse),
        (status = 500, description = "Internal Server Error.", body = ErrorResponse)
    )
)]
pub async fn send_outreach(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SendOutreachRequest>,
) -> Result<Json<OutreachResponse>, AppError> {
    let raw_id = present(payload.lead_id)
        .ok_or_else(|| AppError::BadRequest("leadId is required.".to_string()))?;
    tracing::info!("POST /send - leadId: {}", raw_id);

    let lead_id = parse_lead_id(&raw_id)?;
    state
        .leads
        .get_lead(lead_id)
        .await?
        .ok_or_else(AppError::lead_not_found)?;

    let content = payload.content;
    state
        .leads
        .add_message(
            lead_id,
            content
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_OUTREACH_CONTENT),
            MessageDirection::Outbound,
        )
        .await?;
    state
        .leads
        .update_lead_status(lead_id, LeadStatus::Outreached)
        .await?;

    let job = state
        .queue
        .add_job(JobType::SendEmail, outreach_job_data(lead_id, content))
        .await;

    Ok(Json(OutreachResponse {
        message: "Outbound message enqueued".to_string(),
        job_id: job.id,
    }))
}

/// Builds the `SEND_EMAIL` payload.
///
/// `content` is only present when the request carried one, and is passed
/// through as given (an empty string stays empty).
fn outreach_job_data(lead_id: Uuid, content: Option<String>) -> Value {
    let mut data = Map::new();
    data.insert("leadId".to_string(), Value::String(lead_id.to_string()));
    if let Some(content) = content {
        data.insert("content".to_string(), Value::String(content));
    }
    Value::Object(data)
}

/// POST /reply
///
/// Simulates receiving a reply from a prospect (e.g. via webhook).
#[utoipa::path(
    post,
    path = "/reply",
    tag = "Outreach",
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply received and logged.", body = ReplyResponse),
        (status = 400, description = "Validation Error (Missing leadId or content).", body = ErrorResponse),
        (status = 404, description = "Lead not found.", body = ErrorResponse),
        (status = 500, description = "Internal Server Error.", body = ErrorResponse)
    )
)]
pub async fn handle_reply(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<ReplyRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let (Some(raw_id), Some(content)) = (present(payload.lead_id), present(payload.content))
    else {
        return Err(AppError::BadRequest(
            "leadId and content are required.".to_string(),
        ));
    };
    tracing::info!("POST /reply - leadId: {}", raw_id);

    let lead_id = parse_lead_id(&raw_id)?;
    state
        .leads
        .get_lead(lead_id)
        .await?
        .ok_or_else(AppError::lead_not_found)?;

    state
        .leads
        .add_message(lead_id, &content, MessageDirection::Inbound)
        .await?;
    state
        .leads
        .update_lead_status(lead_id, LeadStatus::Replied)
        .await?;

    Ok(Json(ReplyResponse {
        message: "Reply received and logged".to_string(),
    }))
}

/// POST /ai/reply
///
/// Generates an AI reply to the prospect's latest inbound message, stores it
/// as an outbound message and enqueues a `GENERATE_AI_REPLY` job.
///
/// # Arguments
///
/// * `payload` - the `leadId` to answer. Without an inbound message the
///   prompt falls back to `"Follow up"`.
///
/// # Returns
///
/// The generated text (`aiContent`) and the id of the enqueued job.
#[utoipa::path(
    post,
    path = "/ai/reply",
    tag = "AI",
    request_body = AiReplyRequest,
    responses(
        (status = 200, description = "AI reply generated and enqueued.", body = AiReplyResponse),
        (status = 400, description = "Validation Error (Missing leadId).", body = ErrorResponse),
        (status = 404, description = "Lead not found.", body = ErrorResponse),
        (status = 500, description = "Internal Server Error.", body = ErrorResponse)
    )
)]
pub async fn generate_ai_reply(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<AiReplyRequest>,
) -> Result<Json<AiReplyResponse>, AppError> {
    let raw_id = present(payload.lead_id)
        .ok_or_else(|| AppError::BadRequest("leadId is required.".to_string()))?;
    tracing::info!("POST /ai/reply - leadId: {}", raw_id);

    let lead_id = parse_lead_id(&raw_id)?;
    let details = state
        .leads
        .get_lead(lead_id)
        .await?
        .ok_or_else(AppError::lead_not_found)?;

    let prompt = details.last_inbound().unwrap_or(DEFAULT_AI_PROMPT);
    let ai_content = state.ai.generate_response(&details.lead.name, prompt).await;

    state
        .leads
        .add_message(lead_id, &ai_content, MessageDirection::Outbound)
        .await?;
    state
        .leads
        .update_lead_status(lead_id, LeadStatus::AiReplied)
        .await?;
    state
        .leads
        .log_event(lead_id, EventType::AiReplyGenerated, Some(&ai_content))
        .await;

    let job = state
        .queue
        .add_job(
            JobType::GenerateAiReply,
            json!({ "leadId": lead_id.to_string(), "aiContent": ai_content }),
        )
        .await;

    Ok(Json(AiReplyResponse {
        message: "AI reply generated and enqueued".to_string(),
        ai_content,
        job_id: job.id,
    }))
}

/// GET /lead/:id
///
/// Retrieves a lead with its messages, event logs and background jobs.
///
/// # Returns
///
/// The lead flattened with `messages`, `logs` and `jobs`. An id that is not
/// a UUID can never match, so it is a 404 like any unknown lead.
#[utoipa::path(
    get,
    path = "/lead/{id}",
    tag = "Leads",
    params(("id" = String, Path, description = "The lead ID")),
    responses(
        (status = 200, description = "The lead details.", body = LeadView),
        (status = 404, description = "Lead not found.", body = ErrorResponse),
        (status = 500, description = "Internal Server Error.", body = ErrorResponse)
    )
)]
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeadView>, AppError> {
    tracing::info!("GET /lead/{}", id);

    let lead_id = parse_lead_id(&id)?;
    let details = state
        .leads
        .get_lead(lead_id)
        .await?
        .ok_or_else(AppError::lead_not_found)?;

    let jobs = state.queue.jobs_by_lead(&lead_id.to_string()).await;

    Ok(Json(LeadView { details, jobs }))
}
