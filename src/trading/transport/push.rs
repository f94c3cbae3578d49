use std::env;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::app_config::env::env_or_default;

/// 推送通道。生产实现是LINE push，测试用内存实现替换
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_push(&self, text: &str) -> Result<()>;
}

/// LINE Messaging API push
pub struct PushClient {
    client: Client,
    api_url: String,
    token: String,
    recipient: String,
}

impl PushClient {
    pub fn new(api_url: String, token: String, recipient: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            token,
            recipient,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_url = env_or_default("PUSH_API_URL", "https://api.line.me/v2/bot/message/push");
        let token = env::var("PUSH_TOKEN").map_err(|_| anyhow!("PUSH_TOKEN must be set"))?;
        let recipient =
            env::var("PUSH_RECIPIENT").map_err(|_| anyhow!("PUSH_RECIPIENT must be set"))?;
        Ok(Self::new(api_url, token, recipient))
    }
}

#[async_trait]
impl MessageTransport for PushClient {
    async fn send_push(&self, text: &str) -> Result<()> {
        let body = json!({
            "to": self.recipient,
            "messages": [{ "type": "text", "text": text }],
        });
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("push sent, {} chars", text.chars().count());
            Ok(())
        } else {
            let response_body = response.text().await.unwrap_or_default();
            debug!("push response: {}", response_body);
            Err(anyhow!("push failed: status={} body={}", status, response_body))
        }
    }
}
