//! OpenAPI document derived from the handler annotations.

use utoipa::openapi::{server::ServerBuilder, OpenApi as OpenApiDoc};
use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    AiReplyRequest, AiReplyResponse, CreateLeadRequest, ErrorResponse, EventLog, EventType, Job,
    JobStatus, JobType, Lead, LeadDetails, LeadStatus, LeadView, Message, MessageDirection,
    OutreachResponse, ReplyRequest, ReplyResponse, SendOutreachRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SalesPad Outbound Automation API",
        version = "1.0.0",
        description = "Lead intake, outreach and AI-assisted replies backed by a simulated job queue."
    ),
    paths(
        handlers::create_lead,
        handlers::get_lead,
        handlers::send_outreach,
        handlers::handle_reply,
        handlers::generate_ai_reply,
        handlers::health,
    ),
    components(schemas(
        Lead,
        LeadStatus,
        Message,
        MessageDirection,
        EventLog,
        EventType,
        Job,
        JobType,
        JobStatus,
        LeadDetails,
        LeadView,
        CreateLeadRequest,
        SendOutreachRequest,
        ReplyRequest,
        AiReplyRequest,
        OutreachResponse,
        ReplyResponse,
        AiReplyResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Leads", description = "Lead intake and lookup"),
        (name = "Outreach", description = "Outbound messages and prospect replies"),
        (name = "AI", description = "Generated replies"),
        (name = "System", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Builds the document, advertising `server_url` as the only server.
pub fn api_doc(server_url: &str) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![ServerBuilder::new()
        .url(server_url)
        .description(Some("SalesPad API server"))
        .build()]);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = api_doc("http://localhost:3000");
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in ["/lead", "/lead/{id}", "/send", "/reply", "/ai/reply", "/health"] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {} in {:?}",
                expected,
                paths
            );
        }
    }

    #[test]
    fn advertises_configured_server() {
        let doc = api_doc("https://salespad.example.com");
        let servers = doc.servers.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].url, "https://salespad.example.com");
        assert_eq!(doc.info.title, "SalesPad Outbound Automation API");
    }
}
