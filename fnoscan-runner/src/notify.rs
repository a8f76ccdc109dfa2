//! Scan notifications.
//!
//! Telegram is the only shipped channel. Credentials come from
//! `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID`; when either is missing no notifier
//! is built and the scan runs silently.

use crate::predictor::IndexComparison;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected with HTTP {status}")]
    Rejected { status: u16 },
}

pub trait Notifier {
    fn send(&self, message: &str) -> Result<(), NotifyError>;
}

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API.to_string(),
        })
    }

    /// Build from environment variables; `Ok(None)` when not configured.
    pub fn from_env() -> Result<Option<Self>, NotifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, NotifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key| lookup(key).filter(|v| !v.trim().is_empty());
        match (present(TOKEN_VAR), present(CHAT_ID_VAR)) {
            (Some(token), Some(chat_id)) => Self::new(token, chat_id).map(Some),
            _ => {
                debug!("telegram credentials not set, notifications disabled");
                Ok(None)
            }
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({ "chat_id": self.chat_id, "text": message });
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        debug!(chat_id = %self.chat_id, "telegram message sent");
        Ok(())
    }
}

/// Human-readable scan summary for notifications.
pub fn market_message(shortlisted: usize, up_probability: f64, cmp: &IndexComparison) -> String {
    format!(
        "Shortlisted {shortlisted} stocks. Market up probability: {:.1}%\n\
         Avg stock change: {:.2}%\n\
         NIFTY50: {:.2}%, BankNifty: {:.2}%",
        up_probability * 100.0,
        cmp.stocks * 100.0,
        cmp.nifty * 100.0,
        cmp.banknifty * 100.0,
    )
}
