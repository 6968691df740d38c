pub mod in_memory;

use crate::core::errors::BillpayError;
use crate::core::models::{Notification, NotificationLevel};
use async_trait::async_trait;

/// Delivers user-facing toasts. Diagnostics go through `tracing`, not here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        level: NotificationLevel,
        message: &str,
        recipient: Option<&str>,
    ) -> Result<(), BillpayError>;
    /// Removes and returns everything pending for `recipient`, plus broadcasts.
    async fn drain(&self, recipient: Option<&str>) -> Result<Vec<Notification>, BillpayError>;
}
