use std::time::Duration;

/// Stand-in for an LLM provider. Answers with a canned, personalised
/// follow-up after a fixed delay.
#[derive(Debug, Clone)]
pub struct AiService {
    delay: Duration,
}

impl AiService {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Generates a reply for `lead_name` to the prospect's last message.
    pub async fn generate_response(&self, lead_name: &str, prospect_reply: &str) -> String {
        tracing::info!(
            "[AI] Generating response for {} based on: {:?}",
            lead_name,
            prospect_reply
        );

        tokio::time::sleep(self.delay).await;

        format!(
            "Hi {}, thanks for getting back to us! That sounds interesting. \
             Would you be open to a quick 10-minute chat next Tuesday to dive deeper?",
            lead_name
        )
    }
}
