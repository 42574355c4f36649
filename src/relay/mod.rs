// Mail relay for the contact and feedback forms
pub mod limiter;
pub mod mailer;

use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::validation as v;

pub use limiter::SubmissionLimiter;
pub use mailer::{HttpMailer, Mailer, OutgoingMail};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid submission: {0}")]
    Invalid(String),
    #[error("too many submissions, retry in {0}s")]
    TooSoon(u64),
    #[error("mail relay is not configured")]
    NotConfigured,
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

impl RelayError {
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Invalid(_) => "invalid_input",
            RelayError::TooSoon(_) => "too_many_requests",
            RelayError::NotConfigured => "relay_not_configured",
            RelayError::Delivery(_) => "delivery_failed",
        }
    }
}

/// Contact or feedback form body. `website` is a honeypot left empty by humans.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub website: Option<String>,
}

impl Submission {
    pub fn is_bot(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Contact,
    Feedback,
}

impl Channel {
    fn subject(self, name: &str) -> String {
        match self {
            Channel::Contact => format!("New enquiry from {}", name),
            Channel::Feedback => format!("Feedback from {}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    /// Honeypot tripped: answer as if sent, deliver nothing.
    Discarded,
}

pub struct Relay {
    mailer: Option<Arc<dyn Mailer>>,
    limiter: SubmissionLimiter,
    from: String,
    to: String,
}

impl Relay {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, cfg: &RelayConfig) -> Self {
        Self {
            mailer,
            limiter: SubmissionLimiter::new(cfg.min_interval),
            from: cfg.mail_from.clone(),
            to: cfg.mail_to.clone(),
        }
    }

    /// Builds the relay from config; without `MAIL_API_URL` submissions fail with 500.
    pub fn from_config(cfg: &RelayConfig) -> anyhow::Result<Self> {
        let mailer: Option<Arc<dyn Mailer>> = match (&cfg.mail_api_url, &cfg.mail_api_key) {
            (Some(url), key) => Some(Arc::new(HttpMailer::new(url, key.clone())?)),
            (None, _) => {
                tracing::warn!("MAIL_API_URL not set; contact and feedback forms will fail");
                None
            }
        };
        Ok(Self::new(mailer, cfg))
    }

    /// Reserves one slot per sender key, all or nothing.
    fn reserve(&self, keys: &[String], now: Instant) -> Result<(), RelayError> {
        for (i, key) in keys.iter().enumerate() {
            if let Err(wait) = self.limiter.try_reserve(key, now) {
                for taken in &keys[..i] {
                    self.limiter.release(taken, now);
                }
                return Err(RelayError::TooSoon(wait.as_secs().max(1)));
            }
        }
        Ok(())
    }

    fn release(&self, keys: &[String], now: Instant) {
        for key in keys {
            self.limiter.release(key, now);
        }
    }

    /// `peer` is the client address; the interval applies to it and to the submitted email.
    pub async fn submit(
        &self,
        channel: Channel,
        sub: Submission,
        peer: Option<&str>,
    ) -> Result<Outcome, RelayError> {
        if sub.is_bot() {
            tracing::info!(?channel, "honeypot filled, dropping submission");
            return Ok(Outcome::Discarded);
        }

        v::relay_message(&sub.name, &sub.email, &sub.message).map_err(RelayError::Invalid)?;

        let mailer = self.mailer.as_ref().ok_or(RelayError::NotConfigured)?;

        let email = sub.email.trim();
        let now = Instant::now();
        self.limiter.cleanup_old_entries(now);
        let mut keys = vec![format!("email:{}", email)];
        if let Some(peer) = peer.map(str::trim).filter(|p| !p.is_empty()) {
            keys.push(format!("peer:{}", peer));
        }
        self.reserve(&keys, now)?;

        let mail = OutgoingMail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: channel.subject(sub.name.trim()),
            text: format!(
                "Name: {}\nEmail: {}\n\n{}",
                sub.name.trim(),
                email,
                sub.message.trim()
            ),
            reply_to: email.to_string(),
        };

        if let Err(e) = mailer.send(&mail).await {
            self.release(&keys, now);
            tracing::error!(?channel, "Mail delivery failed: {:#}", e);
            return Err(RelayError::Delivery(e.to_string()));
        }

        tracing::info!(?channel, "submission relayed");
        Ok(Outcome::Sent)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn submission(email: &str) -> Submission {
        Submission {
            name: "Nia".into(),
            email: email.into(),
            message: "We need a new shop".into(),
            website: None,
        }
    }

    #[tokio::test]
    async fn sends_with_reply_to_submitter() {
        let mailer = Arc::new(RecordingMailer::default());
        let relay = Relay::new(Some(mailer.clone()), &relay_config());

        let out = relay.submit(Channel::Contact, submission("nia@client.test"), None).await.unwrap();
        assert_eq!(out, Outcome::Sent);

        let sent = mailer.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to, "nia@client.test");
        assert_eq!(sent[0].to, "hello@studio.test");
        assert_eq!(sent[0].subject, "New enquiry from Nia");
        assert!(sent[0].text.contains("We need a new shop"));
    }

    #[tokio::test]
    async fn honeypot_is_discarded_silently() {
        let mailer = Arc::new(RecordingMailer::default());
        let relay = Relay::new(Some(mailer.clone()), &relay_config());
        let mut sub = submission("bot@spam.test");
        sub.website = Some("http://spam.test".into());

        assert_eq!(relay.submit(Channel::Feedback, sub, None).await.unwrap(), Outcome::Discarded);
        assert!(mailer.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn repeated_submission_is_throttled() {
        let mailer = Arc::new(RecordingMailer::default());
        let relay = Relay::new(Some(mailer.clone()), &relay_config());

        relay.submit(Channel::Contact, submission("nia@client.test"), None).await.unwrap();
        let err = relay
            .submit(Channel::Feedback, submission("Nia@Client.test"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TooSoon(_)));
        assert_eq!(mailer.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn changing_email_does_not_dodge_peer_interval() {
        let mailer = Arc::new(RecordingMailer::default());
        let relay = Relay::new(Some(mailer.clone()), &relay_config());
        let peer = Some("203.0.113.9");

        relay
            .submit(Channel::Contact, submission("nia@client.test"), peer)
            .await
            .unwrap();
        let err = relay
            .submit(Channel::Contact, submission("other@client.test"), peer)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TooSoon(_)));

        // the refused attempt must not hold the new address hostage
        relay
            .submit(Channel::Contact, submission("other@client.test"), Some("198.51.100.4"))
            .await
            .unwrap();
        assert_eq!(mailer.sent.lock().len(), 2);
    }

    #[tokio::test]
    async fn failed_delivery_releases_slot() {
        let failing = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let relay = Relay::new(Some(failing), &relay_config());

        for _ in 0..2 {
            let err = relay
                .submit(Channel::Contact, submission("nia@client.test"), None)
                .await
                .unwrap_err();
            assert!(matches!(err, RelayError::Delivery(_)));
        }
    }

    #[tokio::test]
    async fn missing_mailer_and_bad_input() {
        let relay = Relay::new(None, &relay_config());
        assert!(matches!(
            relay.submit(Channel::Contact, submission("nia@client.test"), None).await,
            Err(RelayError::NotConfigured)
        ));
        assert!(matches!(
            relay.submit(Channel::Contact, submission("not-an-email"), None).await,
            Err(RelayError::Invalid(_))
        ));
    }
}
