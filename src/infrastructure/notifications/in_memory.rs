use crate::core::errors::BillpayError;
use crate::core::models::{Notification, NotificationLevel};
use crate::infrastructure::notifications::Notifier;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const MAX_PENDING_PER_RECIPIENT: usize = 20;
const PENDING_TTL_SECS: i64 = 60 * 60;

/// Pending toasts held until their recipient reads them. Each recipient keeps at most
/// `max_per_recipient` entries (oldest evicted first) and nothing outlives `ttl`.
#[derive(Clone)]
pub struct InMemoryNotifications {
    pending: Arc<RwLock<Vec<Notification>>>,
    max_per_recipient: usize,
    ttl: TimeDelta,
}

impl Default for InMemoryNotifications {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::with_limits(MAX_PENDING_PER_RECIPIENT, TimeDelta::seconds(PENDING_TTL_SECS))
    }

    pub fn with_limits(max_per_recipient: usize, ttl: TimeDelta) -> Self {
        InMemoryNotifications {
            pending: Arc::new(RwLock::new(Vec::new())),
            max_per_recipient: max_per_recipient.max(1),
            ttl,
        }
    }

    /// Pending notifications without consuming them.
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.pending.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifications {
    async fn notify(
        &self,
        level: NotificationLevel,
        message: &str,
        recipient: Option<&str>,
    ) -> Result<(), BillpayError> {
        if message.trim().is_empty() {
            return Err(BillpayError::NotificationError("message cannot be empty".to_string()));
        }
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|n| now - n.timestamp < self.ttl);
        if pending.len() < before {
            debug!(expired = before - pending.len(), "expired unread notifications");
        }

        let queued = pending.iter().filter(|n| n.recipient.as_deref() == recipient).count();
        if queued >= self.max_per_recipient {
            if let Some(oldest) = pending.iter().position(|n| n.recipient.as_deref() == recipient) {
                pending.remove(oldest);
                debug!(?recipient, "evicted oldest unread notification");
            }
        }

        pending.push(Notification {
            id: Uuid::new_v4().to_string(),
            level,
            recipient: recipient.map(String::from),
            message: message.to_string(),
            timestamp: now,
        });
        Ok(())
    }

    async fn drain(&self, recipient: Option<&str>) -> Result<Vec<Notification>, BillpayError> {
        let mut pending = self.pending.write().await;
        let (mine, rest): (Vec<_>, Vec<_>) = pending
            .drain(..)
            .partition(|n| n.recipient.is_none() || n.recipient.as_deref() == recipient);
        *pending = rest;
        Ok(mine)
    }
}
