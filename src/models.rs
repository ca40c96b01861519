use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

// ============ Database Models ============

/// Pipeline position of a lead.
///
/// Transitions are not enforced; any caller may set any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Outreached,
    Replied,
    AiReplied,
}

/// Which side of the conversation a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "message_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// Kind of timeline entry recorded for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    LeadCreated,
    MessageSent,
    ReplyReceived,
    AiReplyGenerated,
}

impl EventType {
    /// Event recorded when a message in `direction` is stored.
    pub fn for_message(direction: MessageDirection) -> Self {
        match direction {
            MessageDirection::Outbound => EventType::MessageSent,
            MessageDirection::Inbound => EventType::ReplyReceived,
        }
    }
}

/// A sales prospect.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique identifier for the lead.
    pub id: Uuid,
    /// Full name of the prospect.
    pub name: String,
    /// Email address, if provided.
    pub email: Option<String>,
    /// Phone number, if provided.
    pub phone: Option<String>,
    /// Current pipeline status.
    pub status: LeadStatus,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

/// A message exchanged with a lead.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    /// Lead the message belongs to.
    pub lead_id: Uuid,
    /// Message body as sent or received.
    pub content: String,
    pub direction: MessageDirection,
    /// When the message was stored. Timelines are ordered by this.
    pub sent_at: DateTime<Utc>,
}

/// An entry in a lead's activity timeline.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub id: Uuid,
    pub lead_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Free-form description, e.g. the message content.
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Validated input for lead creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// ============ Queue Models ============

/// What a queued job simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    SendEmail,
    GenerateAiReply,
}

/// Lifecycle of a queued job.
///
/// `PENDING` while an attempt runs, `RETRYING` during backoff after a failed
/// attempt, then `COMPLETED` or `FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Retrying,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether processing has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A simulated background job. Lives only in process memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Opaque payload; by convention carries a `leadId`.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub status: JobStatus,
    /// Attempts started so far.
    pub attempts: u32,
    /// Attempts allowed before the job is marked `FAILED`.
    pub max_retries: u32,
}

// ============ API Request/Response Models ============

/// Request payload for creating a lead.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateLeadRequest {
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CreateLeadRequest {
    /// Requires a name and at least one contact method. Empty strings count as missing.
    pub fn validate(self) -> Result<NewLead, AppError> {
        let name = present(self.name);
        let email = present(self.email);
        let phone = present(self.phone);

        match name {
            Some(name) if email.is_some() || phone.is_some() => Ok(NewLead { name, email, phone }),
            _ => Err(AppError::BadRequest(
                "Name and at least one contact method (email or phone) are required.".to_string(),
            )),
        }
    }
}

/// Request payload for sending an outbound message.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOutreachRequest {
    pub lead_id: Option<String>,
    /// Message body; a default greeting is used when omitted.
    pub content: Option<String>,
}

/// Request payload for recording a prospect reply.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub lead_id: Option<String>,
    /// What the prospect wrote. Required.
    pub content: Option<String>,
}

/// Request payload for generating an AI reply.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiReplyRequest {
    pub lead_id: Option<String>,
}

/// Lead with its conversation and activity timeline.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadDetails {
    #[serde(flatten)]
    pub lead: Lead,
    pub messages: Vec<Message>,
    pub logs: Vec<EventLog>,
}

impl LeadDetails {
    /// Content of the most recent inbound message, if any.
    pub fn last_inbound(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.direction == MessageDirection::Inbound)
            .map(|m| m.content.as_str())
    }
}

/// Full lead view returned by `GET /lead/{id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadView {
    #[serde(flatten)]
    pub details: LeadDetails,
    pub jobs: Vec<Job>,
}

/// Response to `POST /send`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutreachResponse {
    #[schema(example = "Outbound message enqueued")]
    pub message: String,
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplyResponse {
    #[schema(example = "Reply received and logged")]
    pub message: String,
}

/// Response to `POST /ai/reply`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiReplyResponse {
    #[schema(example = "AI reply generated and enqueued")]
    pub message: String,
    pub ai_content: String,
    pub job_id: Uuid,
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Only set for internal failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Treats absent and empty strings alike.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parses a client-supplied lead id.
///
/// # Arguments
///
/// * `raw` - the id as it appeared in the path or body.
///
/// # Returns
///
/// The UUID, or [`AppError::lead_not_found`] when `raw` is not a UUID,
/// since such an id cannot name a lead.
pub fn parse_lead_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::lead_not_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_needs_name_and_contact() {
        let ok = CreateLeadRequest {
            name: Some("John".into()),
            email: None,
            phone: Some("+15550100".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.phone.as_deref(), Some("+15550100"));
        assert_eq!(ok.email, None);

        let no_contact = CreateLeadRequest {
            name: Some("John".into()),
            email: Some(String::new()),
            phone: None,
        };
        assert!(matches!(no_contact.validate(), Err(AppError::BadRequest(_))));

        let no_name = CreateLeadRequest {
            name: Some(String::new()),
            email: Some("john@example.com".into()),
            phone: None,
        };
        assert!(matches!(no_name.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn statuses_serialize_screaming() {
        assert_eq!(json!(LeadStatus::AiReplied), json!("AI_REPLIED"));
        assert_eq!(json!(JobType::GenerateAiReply), json!("GENERATE_AI_REPLY"));
        assert_eq!(json!(EventType::ReplyReceived), json!("REPLY_RECEIVED"));
    }

    #[test]
    fn lead_details_flatten_lead_fields() {
        let now = Utc::now();
        let lead_id = Uuid::new_v4();
        let details = LeadDetails {
            lead: Lead {
                id: lead_id,
                name: "Ana".into(),
                email: Some("ana@example.com".into()),
                phone: None,
                status: LeadStatus::New,
                created_at: now,
                updated_at: now,
            },
            messages: vec![
                Message {
                    id: Uuid::new_v4(),
                    lead_id,
                    content: "first".into(),
                    direction: MessageDirection::Inbound,
                    sent_at: now,
                },
                Message {
                    id: Uuid::new_v4(),
                    lead_id,
                    content: "ours".into(),
                    direction: MessageDirection::Outbound,
                    sent_at: now,
                },
            ],
            logs: vec![],
        };

        assert_eq!(details.last_inbound(), Some("first"));

        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["name"], "Ana");
        assert_eq!(value["status"], "NEW");
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["messages"][0]["leadId"], json!(lead_id));
    }

    #[test]
    fn malformed_lead_id_is_not_found() {
        assert!(matches!(parse_lead_id("999"), Err(AppError::NotFound(_))));
        assert!(parse_lead_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
