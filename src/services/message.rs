//! Contact message service
//!
//! Stores messages sent through the contact form, with a per-sender limit:
//! a sender (by email or IP address) may send at most `max_messages` within
//! the trailing `window_hours`.

use crate::config::{ContactConfig, MAX_WINDOW_HOURS};
use crate::db::repositories::MessageRepository;
use crate::models::{
    Message, MessageFilter, Outcome, Rejection, MESSAGE_IP_MAX_LEN, MESSAGE_NAME_MAX_LEN,
    MESSAGE_SUBJECT_MAX_LEN,
};
use chrono::{Duration, Utc};
use std::sync::Arc;

pub const MESSAGE_SENT: &str = "Your message has been sent successfully. Thank you for your interest";
pub const MESSAGE_RATE_LIMITED: &str = "You have exceeded the maximum number of allowed messages.";

/// Error types for message service operations
#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Message service
pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    max_messages: i64,
    window: Duration,
}

impl MessageService {
    /// Create a new message service with the configured limits
    ///
    /// The window is clamped to `1..=MAX_WINDOW_HOURS`, the range config
    /// validation accepts.
    pub fn new(repo: Arc<dyn MessageRepository>, config: &ContactConfig) -> Self {
        Self {
            repo,
            max_messages: config.max_messages,
            window: Duration::hours(config.window_hours.clamp(1, MAX_WINDOW_HOURS)),
        }
    }

    /// Whether the sender already reached the limit inside the window.
    ///
    /// Messages match on email, or on IP address when the message has one.
    pub async fn exceeded_max_messages(&self, message: &Message) -> Result<bool, MessageServiceError> {
        let since = Utc::now() - self.window;
        let recent = self
            .repo
            .count_recent(&message.email, message.ip_address.as_deref(), since)
            .await?;

        tracing::debug!(
            "{} recent messages from {} / {:?}",
            recent,
            message.email,
            message.ip_address
        );
        Ok(recent >= self.max_messages)
    }

    /// Store a contact message unless its sender is over the limit
    pub async fn create_message(&self, mut message: Message) -> Result<Outcome<Message>, MessageServiceError> {
        Self::validate(&message)?;

        if self.exceeded_max_messages(&message).await? {
            tracing::warn!("Message from {} refused by rate limit", message.email);
            return Ok(Rejection::rate_limited(MESSAGE_RATE_LIMITED).into());
        }

        message.created_at = Utc::now();
        let created = self.repo.create(&message).await?;

        tracing::info!("Message {} received from {}", created.id, created.email);
        Ok(Outcome::success(created, MESSAGE_SENT))
    }

    /// List messages newest first
    pub async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, MessageServiceError> {
        Ok(self.repo.list(filter).await?)
    }

    fn validate(message: &Message) -> Result<(), MessageServiceError> {
        if message.email.trim().is_empty() {
            return Err(MessageServiceError::ValidationError("Email cannot be empty".to_string()));
        }

        let limits = [
            ("Name", message.name.as_str(), MESSAGE_NAME_MAX_LEN),
            ("Subject", message.subject.as_str(), MESSAGE_SUBJECT_MAX_LEN),
            ("IP address", message.ip_address.as_deref().unwrap_or(""), MESSAGE_IP_MAX_LEN),
        ];
        for (field, value, max) in limits {
            if value.chars().count() > max {
                return Err(MessageServiceError::ValidationError(format!(
                    "{} cannot exceed {} characters",
                    field, max
                )));
            }
        }
        Ok(())
    }
}
