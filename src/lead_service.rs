use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lead_store::LeadStore;
use crate::models::{
    EventType, Lead, LeadDetails, LeadStatus, Message, MessageDirection, NewLead,
};

/// Business actions on leads. Every action that changes a lead's
/// conversation also records an entry in its event log.
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Creates a lead and logs `LEAD_CREATED`.
    pub async fn create_lead(&self, new_lead: NewLead) -> Result<Lead, AppError> {
        let lead = self.store.create(&new_lead).await?;
        self.log_event(
            lead.id,
            EventType::LeadCreated,
            Some(&format!("Lead {} added.", lead.name)),
        )
        .await;
        Ok(lead)
    }

    /// Lead plus its messages and logs, or `None` if it does not exist.
    pub async fn get_lead(&self, id: Uuid) -> Result<Option<LeadDetails>, AppError> {
        let Some(lead) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        let messages = self.store.messages_for_lead(id).await?;
        let logs = self.store.logs_for_lead(id).await?;

        Ok(Some(LeadDetails {
            lead,
            messages,
            logs,
        }))
    }

    pub async fn update_lead_status(
        &self,
        id: Uuid,
        status: LeadStatus,
    ) -> Result<Option<Lead>, AppError> {
        let updated = self.store.update_status(id, status).await?;
        if updated.is_none() {
            tracing::warn!("Status update to {:?} skipped: lead {} not found", status, id);
        }
        Ok(updated)
    }

    /// Appends a message and logs `MESSAGE_SENT` or `REPLY_RECEIVED` with its content.
    pub async fn add_message(
        &self,
        lead_id: Uuid,
        content: &str,
        direction: MessageDirection,
    ) -> Result<Message, AppError> {
        let message = self.store.add_message(lead_id, content, direction).await?;
        self.log_event(lead_id, EventType::for_message(direction), Some(content))
            .await;
        Ok(message)
    }

    /// Best-effort: failures are logged and never reach the caller.
    pub async fn log_event(&self, lead_id: Uuid, event_type: EventType, details: Option<&str>) {
        match self.store.add_log(lead_id, event_type, details).await {
            Ok(_) => tracing::info!(
                "[EventLog] {:?} for Lead {}: {}",
                event_type,
                lead_id,
                details.unwrap_or_default()
            ),
            Err(e) => tracing::error!("[EventLog] Failed to log event {:?}: {}", event_type, e),
        }
    }
}
