use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::notify::NotificationConfig;
use crate::queue::QueueConfig;
use crate::workers::TrackerConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard backend base URL
    pub livescore_api_url: String,

    /// Interval in seconds for polling live scores
    pub live_poll_interval: u64,

    /// Interval in seconds for draining the event queue
    pub queue_process_interval: u64,

    /// Maximum pending queue items
    pub queue_capacity: usize,

    /// Grouping window in seconds
    pub group_window_secs: u64,

    /// Notification history capacity
    pub notification_history: usize,

    /// Seconds before an alert closes itself
    pub notification_dismiss_secs: u64,

    /// Recent digests kept for sharing
    pub event_feed_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            livescore_api_url: env::var("LIVESCORE_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),

            live_poll_interval: parse_var("LIVE_POLL_INTERVAL", "10")?,
            queue_process_interval: parse_var("QUEUE_PROCESS_INTERVAL", "2")?,
            queue_capacity: parse_var("QUEUE_CAPACITY", "50")?,
            group_window_secs: parse_var("GROUP_WINDOW_SECS", "30")?,
            notification_history: parse_var("NOTIFICATION_HISTORY", "10")?,
            notification_dismiss_secs: parse_var("NOTIFICATION_DISMISS_SECS", "5")?,
            event_feed_capacity: parse_var("EVENT_FEED_CAPACITY", "10")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the workers cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.live_poll_interval > 0,
            "LIVE_POLL_INTERVAL must be greater than zero"
        );
        ensure!(
            self.queue_process_interval > 0,
            "QUEUE_PROCESS_INTERVAL must be greater than zero"
        );
        ensure!(self.queue_capacity > 0, "QUEUE_CAPACITY must be greater than zero");
        Ok(())
    }

    pub fn queue(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.queue_capacity,
            group_window: Duration::from_secs(self.group_window_secs),
            process_interval: Duration::from_secs(self.queue_process_interval),
        }
    }

    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(self.live_poll_interval),
        }
    }

    pub fn notifications(&self) -> NotificationConfig {
        NotificationConfig {
            history_capacity: self.notification_history,
            dismiss_after: Duration::from_secs(self.notification_dismiss_secs),
            ..Default::default()
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid number", name))
}
