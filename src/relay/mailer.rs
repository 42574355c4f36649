// Outbound mail through an HTTP mail API
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub reply_to: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        url::Url::parse(url).with_context(|| format!("invalid MAIL_API_URL '{}'", url))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build mail HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let mut req = self.client.post(&self.url).json(mail);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.context("mail API unreachable")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "mail API returned {}: {}",
                status.as_u16(),
                body.trim().chars().take(200).collect::<String>()
            );
        }
        Ok(())
    }
}
