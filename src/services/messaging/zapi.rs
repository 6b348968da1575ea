use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::MessagingProvider;

/// WhatsApp delivery through the Z-API send-text endpoint.
pub struct ZapiProvider {
    instance_id: String,
    token: String,
    client_token: String,
    client: reqwest::Client,
}

impl ZapiProvider {
    pub fn new(instance_id: String, token: String, client_token: String) -> Self {
        Self {
            instance_id,
            token,
            client_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for ZapiProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.z-api.io/instances/{}/token/{}/send-text",
            self.instance_id, self.token
        );

        let response = self
            .client
            .post(&url)
            .header("Client-Token", &self.client_token)
            .json(&json!({ "phone": to, "message": body }))
            .send()
            .await
            .context("failed to send WhatsApp message")?;

        let status = response.status();
        tracing::info!(phone = %to, status = %status, "Z-API send-text");

        response
            .error_for_status()
            .context("Z-API returned error")?;

        Ok(())
    }
}
