use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{EventLog, EventType, Lead, LeadStatus, Message, MessageDirection, NewLead};

/// Persistence operations for leads and their timelines.
///
/// Implementations only store and fetch; business rules live in
/// [`LeadService`](crate::lead_service::LeadService).
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert a new lead with status `NEW`.
    async fn create(&self, new_lead: &NewLead) -> Result<Lead, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    /// Returns `None` when no lead has this id.
    async fn update_status(&self, id: Uuid, status: LeadStatus) -> Result<Option<Lead>, AppError>;

    async fn add_message(
        &self,
        lead_id: Uuid,
        content: &str,
        direction: MessageDirection,
    ) -> Result<Message, AppError>;

    async fn add_log(
        &self,
        lead_id: Uuid,
        event_type: EventType,
        details: Option<&str>,
    ) -> Result<EventLog, AppError>;

    /// Messages ordered by `sent_at`, oldest first.
    async fn messages_for_lead(&self, lead_id: Uuid) -> Result<Vec<Message>, AppError>;

    /// Logs ordered by `timestamp`, oldest first.
    async fn logs_for_lead(&self, lead_id: Uuid) -> Result<Vec<EventLog>, AppError>;
}

/// PostgreSQL-backed lead storage.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn create(&self, new_lead: &NewLead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (id, name, email, phone, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'NEW', now(), now())
            RETURNING id, name, email, phone, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_lead.name)
        .bind(new_lead.email.as_deref())
        .bind(new_lead.phone.as_deref())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert lead")
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(
            "SELECT id, name, email, phone, status, created_at, updated_at FROM leads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load lead {}", id))
    }

    async fn update_status(&self, id: Uuid, status: LeadStatus) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, phone, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to update status of lead {}", id))
    }

    async fn add_message(
        &self,
        lead_id: Uuid,
        content: &str,
        direction: MessageDirection,
    ) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, lead_id, content, direction, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, lead_id, content, direction, sent_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(content)
        .bind(direction)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to store message for lead {}", lead_id))
    }

    async fn add_log(
        &self,
        lead_id: Uuid,
        event_type: EventType,
        details: Option<&str>,
    ) -> Result<EventLog, AppError> {
        sqlx::query_as::<_, EventLog>(
            r#"
            INSERT INTO event_logs (id, lead_id, event_type, details, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, lead_id, event_type, details, timestamp
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(event_type)
        .bind(details)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to store event log for lead {}", lead_id))
    }

    async fn messages_for_lead(&self, lead_id: Uuid) -> Result<Vec<Message>, AppError> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, lead_id, content, direction, sent_at
            FROM messages
            WHERE lead_id = $1
            ORDER BY sent_at ASC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list messages")
    }

    async fn logs_for_lead(&self, lead_id: Uuid) -> Result<Vec<EventLog>, AppError> {
        sqlx::query_as::<_, EventLog>(
            r#"
            SELECT id, lead_id, event_type, details, timestamp
            FROM event_logs
            WHERE lead_id = $1
            ORDER BY timestamp ASC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list event logs")
    }
}
