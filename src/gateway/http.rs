// reqwest-backed Auth Gateway
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::AuthGateway;
use crate::errors::{AuthCall, AuthError};
use crate::models::auth_types::{
    IdentityResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use crate::models::principal::Principal;

pub struct HttpAuthGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    /// `base_url` is the API root, e.g. `https://api.studio.test/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url).with_context(|| format!("invalid API base URL '{}'", base_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn failure(call: AuthCall, resp: reqwest::Response) -> AuthError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body);
        tracing::debug!(?call, status, %message, "auth service rejected request");
        AuthError::from_status(call, status, &message)
    }
}

/// Pull a readable message out of the usual error body shapes.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("error")
            .and_then(|e| {
                e.as_str()
                    .map(str::to_string)
                    .or_else(|| e.get("message").and_then(Value::as_str).map(str::to_string))
            })
            .or_else(|| v.get("message").and_then(Value::as_str).map(str::to_string))
    });
    from_json.unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .client
            .post(self.endpoint("auth/login"))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::failure(AuthCall::Login, resp).await);
        }
        Ok(resp.json::<LoginResponse>().await?)
    }

    async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let mut req = self.client.post(self.endpoint("auth/logout")).json(&json!({}));
        if let Some(tok) = token {
            req = req.bearer_auth(tok);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(Self::failure(AuthCall::Logout, resp).await);
        }
        Ok(())
    }

    async fn current_identity(&self, token: &str) -> Result<Principal, AuthError> {
        let resp = self
            .client
            .get(self.endpoint("auth/me"))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::failure(AuthCall::CurrentIdentity, resp).await);
        }
        Ok(resp.json::<IdentityResponse>().await?.user)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<String, AuthError> {
        let resp = self
            .client
            .post(self.endpoint("auth/register"))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::failure(AuthCall::Register, resp).await);
        }
        let parsed = resp.json::<RegisterResponse>().await?;
        Ok(parsed
            .message
            .unwrap_or_else(|| "Registration received.".to_string()))
    }
}
