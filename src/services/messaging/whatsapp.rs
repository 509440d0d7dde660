use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::MessagingProvider;

pub struct WhatsAppCloudProvider {
    api_version: String,
    phone_number_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl WhatsAppCloudProvider {
    pub fn new(api_version: String, phone_number_id: String, access_token: String) -> Self {
        Self {
            api_version,
            phone_number_id,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://graph.facebook.com/{}/{}/messages",
            self.api_version, self.phone_number_id
        )
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppCloudProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.phone_number_id.is_empty() && !self.access_token.is_empty(),
            "WhatsApp credentials are not configured"
        );

        self.client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to,
                "text": { "body": body },
            }))
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        Ok(())
    }
}
