use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::models::{MatchContext, NotificationOptions, NotificationRecord, Permission};
use crate::notify::NotificationPlatform;

/// Notification service settings
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Records kept in history, oldest dropped first
    pub history_capacity: usize,

    /// Alerts close themselves after this long
    pub dismiss_after: Duration,

    /// Applied under every caller's options
    pub defaults: NotificationOptions,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            dismiss_after: Duration::from_secs(5),
            defaults: NotificationOptions {
                icon: Some("/favicon.ico".to_string()),
                badge: Some("/favicon.ico".to_string()),
                vibrate: Some(vec![200, 100, 200]),
                silent: Some(false),
                ..Default::default()
            },
        }
    }
}

/// Handle to an alert that is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationHandle {
    pub id: u64,
}

/// Shows time-boxed, tag-deduplicated match alerts
pub struct NotificationService {
    platform: Arc<dyn NotificationPlatform>,
    config: NotificationConfig,
    permission: AtomicBool,
    negotiated: AtomicBool,
    history: Mutex<VecDeque<NotificationRecord>>,
}

impl NotificationService {
    /// Create the service; nothing is shown until [`init`](Self::init) grants permission
    pub fn new(platform: Arc<dyn NotificationPlatform>, config: NotificationConfig) -> Self {
        Self {
            platform,
            config,
            permission: AtomicBool::new(false),
            negotiated: AtomicBool::new(false),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// One-time permission negotiation. Later calls do nothing.
    pub async fn init(&self) {
        if self.negotiated.swap(true, Ordering::SeqCst) {
            return;
        }

        if !self.platform.is_supported() {
            info!("Notifications are not supported on this platform");
            return;
        }

        let granted = match self.platform.permission() {
            Permission::Granted => true,
            Permission::Denied => false,
            Permission::Default => self.platform.request_permission().await == Permission::Granted,
        };

        self.permission.store(granted, Ordering::SeqCst);
        info!(
            "Notification permission {}",
            if granted { "granted" } else { "unavailable" }
        );
    }

    pub fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    /// Show an alert. Silent no-op without permission; platform failures are
    /// logged and also yield `None`.
    pub fn show(&self, title: &str, options: NotificationOptions) -> Option<NotificationHandle> {
        if !self.has_permission() {
            return None;
        }

        let options = options.merged_over(&self.config.defaults);

        let id = match self.platform.display(title, &options) {
            Ok(id) => id,
            Err(e) => {
                error!("Notification error: {}", e);
                return None;
            }
        };

        {
            let mut history = self.history.lock();
            history.push_front(NotificationRecord {
                id,
                title: title.to_string(),
                options,
                timestamp: Utc::now(),
            });
            history.truncate(self.config.history_capacity);
        }

        self.schedule_dismiss(id);
        debug!("Notification shown: {}", title);

        Some(NotificationHandle { id })
    }

    fn schedule_dismiss(&self, id: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let platform = Arc::clone(&self.platform);
        let delay = self.config.dismiss_after;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            platform.close(id);
        });
    }

    pub fn show_goal(
        &self,
        ctx: &MatchContext,
        scorer: &str,
        minute: &str,
        assist: Option<&str>,
    ) -> Option<NotificationHandle> {
        let title = format!("⚽ GOAL! {}", ctx.score_line());
        let assist = assist
            .map(|a| format!(" (assist: {})", a))
            .unwrap_or_default();
        let body = format!("{} scores{} at {}'", scorer, assist, minute);

        self.show(
            &title,
            NotificationOptions {
                silent: Some(false),
                ..NotificationOptions::with_body(body)
                    .tag(format!("goal-{}-{}", ctx.id, minute))
                    .renotify()
            },
        )
    }

    pub fn show_card(
        &self,
        ctx: &MatchContext,
        player: &str,
        card_type: &str,
        minute: &str,
    ) -> Option<NotificationHandle> {
        let emoji = if card_type.contains("Red") { "🟥" } else { "🟨" };
        let title = format!("{} CARD! {}", emoji, ctx.score_line());
        let body = format!("{} receives {} at {}'", player, card_type, minute);

        self.show(
            &title,
            NotificationOptions::with_body(body)
                .tag(format!("card-{}-{}", ctx.id, minute))
                .renotify(),
        )
    }

    pub fn show_halftime(&self, ctx: &MatchContext) -> Option<NotificationHandle> {
        let title = format!("⏸️ HALF TIME: {}", ctx.score_line());

        self.show(
            &title,
            NotificationOptions::with_body("The first half has ended. Join us for the second half!")
                .tag(format!("ht-{}", ctx.id))
                .renotify(),
        )
    }

    pub fn show_fulltime(&self, ctx: &MatchContext) -> Option<NotificationHandle> {
        let title = format!("✅ FULL TIME: {}", ctx.score_line());
        let body = format!(
            "The match has ended. Final score: {} - {}",
            ctx.home_score, ctx.away_score
        );

        self.show(
            &title,
            NotificationOptions::with_body(body)
                .tag(format!("ft-{}", ctx.id))
                .renotify(),
        )
    }

    /// Only shows when the score actually differs between the two contexts
    pub fn show_score_change(
        &self,
        previous: &MatchContext,
        current: &MatchContext,
    ) -> Option<NotificationHandle> {
        if previous.home_score == current.home_score && previous.away_score == current.away_score {
            return None;
        }

        let title = format!("⚽ SCORE CHANGE! {}", current.score_line());
        let body = format!("Score updated at {}'", current.minute);

        self.show(
            &title,
            NotificationOptions::with_body(body)
                .tag(format!("score-{}-{}", current.id, current.minute))
                .renotify(),
        )
    }

    /// Shown alerts, newest first
    pub fn get_history(&self) -> Vec<NotificationRecord> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}
