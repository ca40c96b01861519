//! In-memory lead store for tests and local experiments.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lead_store::LeadStore;
use crate::models::{EventLog, EventType, Lead, LeadStatus, Message, MessageDirection, NewLead};

/// Keeps leads, messages and logs in process memory.
///
/// - No persistence
/// - Messages and logs must reference an existing lead, mirroring the
///   foreign keys of the Postgres schema
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
    messages: RwLock<Vec<Message>>,
    logs: RwLock<Vec<EventLog>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn ensure_lead(&self, lead_id: Uuid) -> Result<(), AppError> {
        if self.leads.read().await.contains_key(&lead_id) {
            Ok(())
        } else {
            Err(AppError::InternalError(format!(
                "lead {} does not exist",
                lead_id
            )))
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, new_lead: &NewLead) -> Result<Lead, AppError> {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name: new_lead.name.clone(),
            email: new_lead.email.clone(),
            phone: new_lead.phone.clone(),
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.leads.write().await.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.read().await.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: LeadStatus) -> Result<Option<Lead>, AppError> {
        let mut leads = self.leads.write().await;
        Ok(leads.get_mut(&id).map(|lead| {
            lead.status = status;
            lead.updated_at = Utc::now();
            lead.clone()
        }))
    }

    async fn add_message(
        &self,
        lead_id: Uuid,
        content: &str,
        direction: MessageDirection,
    ) -> Result<Message, AppError> {
        self.ensure_lead(lead_id).await?;
        let message = Message {
            id: Uuid::new_v4(),
            lead_id,
            content: content.to_string(),
            direction,
            sent_at: Utc::now(),
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn add_log(
        &self,
        lead_id: Uuid,
        event_type: EventType,
        details: Option<&str>,
    ) -> Result<EventLog, AppError> {
        self.ensure_lead(lead_id).await?;
        let log = EventLog {
            id: Uuid::new_v4(),
            lead_id,
            event_type,
            details: details.map(str::to_string),
            timestamp: Utc::now(),
        };
        self.logs.write().await.push(log.clone());
        Ok(log)
    }

    async fn messages_for_lead(&self, lead_id: Uuid) -> Result<Vec<Message>, AppError> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.lead_id == lead_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }

    async fn logs_for_lead(&self, lead_id: Uuid) -> Result<Vec<EventLog>, AppError> {
        let mut logs: Vec<EventLog> = self
            .logs
            .read()
            .await
            .iter()
            .filter(|l| l.lead_id == lead_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.timestamp);
        Ok(logs)
    }
}
