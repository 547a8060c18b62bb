use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{NotificationOptions, Permission};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("platform rejected notification: {0}")]
    Rejected(String),
}

/// Permission-gated alert primitive provided by the host
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Whether the host can show alerts at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Current permission without prompting
    fn permission(&self) -> Permission;

    /// Ask the user; resolves to the decision
    async fn request_permission(&self) -> Permission;

    /// Show an alert and return its handle id
    fn display(&self, title: &str, options: &NotificationOptions) -> Result<u64, NotifyError>;

    /// Dismiss a previously shown alert
    fn close(&self, id: u64);
}

/// Headless backend that writes alerts to the log
#[derive(Debug, Default)]
pub struct LogPlatform {
    next_id: AtomicU64,
}

impl LogPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationPlatform for LogPlatform {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn display(&self, title: &str, options: &NotificationOptions) -> Result<u64, NotifyError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "Notification #{} [{}] {} | {}",
            id,
            options.tag.as_deref().unwrap_or("-"),
            title,
            options.body.as_deref().unwrap_or("")
        );
        Ok(id)
    }

    fn close(&self, id: u64) {
        debug!("Notification #{} dismissed", id);
    }
}
