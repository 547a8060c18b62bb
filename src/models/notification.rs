use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform permission state for showing alerts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// User has not decided yet
    Default,
    Granted,
    Denied,
}

/// Alert options; unset fields fall back to the service defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: Option<String>,

    /// Alerts sharing a tag replace each other instead of stacking
    pub tag: Option<String>,

    pub icon: Option<String>,
    pub badge: Option<String>,

    /// Vibration pattern in milliseconds
    pub vibrate: Option<Vec<u32>>,

    pub silent: Option<bool>,

    /// Re-alert even when replacing an alert with the same tag
    pub renotify: Option<bool>,
}

impl NotificationOptions {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn renotify(mut self) -> Self {
        self.renotify = Some(true);
        self
    }

    /// Fill every unset field from `defaults`
    pub fn merged_over(self, defaults: &NotificationOptions) -> Self {
        Self {
            body: self.body.or_else(|| defaults.body.clone()),
            tag: self.tag.or_else(|| defaults.tag.clone()),
            icon: self.icon.or_else(|| defaults.icon.clone()),
            badge: self.badge.or_else(|| defaults.badge.clone()),
            vibrate: self.vibrate.or_else(|| defaults.vibrate.clone()),
            silent: self.silent.or(defaults.silent),
            renotify: self.renotify.or(defaults.renotify),
        }
    }
}

/// An alert that was shown
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    /// Platform handle id
    pub id: u64,
    pub title: String,

    /// Options after defaults were applied
    pub options: NotificationOptions,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_options_override_defaults() {
        let defaults = NotificationOptions {
            icon: Some("/favicon.ico".to_string()),
            vibrate: Some(vec![200, 100, 200]),
            silent: Some(false),
            ..Default::default()
        };

        let merged = NotificationOptions {
            silent: Some(true),
            ..NotificationOptions::with_body("hello").tag("ht-1")
        }
        .merged_over(&defaults);

        assert_eq!(merged.body.as_deref(), Some("hello"));
        assert_eq!(merged.tag.as_deref(), Some("ht-1"));
        assert_eq!(merged.icon.as_deref(), Some("/favicon.ico"));
        assert_eq!(merged.vibrate, Some(vec![200, 100, 200]));
        assert_eq!(merged.silent, Some(true));
        assert_eq!(merged.renotify, None);
    }
}
