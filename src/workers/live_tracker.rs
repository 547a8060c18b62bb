use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::api::LiveScoreSource;
use crate::models::{MatchEvent, MatchId, MatchSnapshot, TrackedMatches};
use crate::notify::NotificationService;
use crate::queue::EventQueue;

/// Live tracker settings
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Called with the full match list after every successful poll
pub type MatchUpdateCallback = Arc<dyn Fn(&[MatchSnapshot]) + Send + Sync>;

/// Diff two snapshots of the same match.
///
/// Every rule is checked on its own, so one poll can yield several events.
/// `previous == None` means the match was not seen before.
pub fn detect_changes(
    previous: Option<&MatchSnapshot>,
    current: &MatchSnapshot,
) -> Vec<MatchEvent> {
    let Some(previous) = previous else {
        if current.minute != "0" && current.minute != "NS" {
            return vec![MatchEvent::started(current.context())];
        }
        return Vec::new();
    };

    let mut events = Vec::new();

    if previous.score_key() != current.score_key() {
        events.push(MatchEvent::Goal {
            previous: previous.context(),
            current: current.context(),
        });
    }

    if previous.minute != "45" && current.minute == "45" {
        events.push(MatchEvent::halftime(current.context()));
    }

    if previous.minute != "90" && current.minute == "90" {
        events.push(MatchEvent::fulltime(current.context()));
    }

    // Minute-only changes produce nothing

    events
}

/// Polls live scores, diffs each match against its last snapshot and feeds
/// the resulting events to the queue and the notifier
pub struct LiveMatchTracker {
    source: Arc<dyn LiveScoreSource>,
    queue: Arc<EventQueue>,
    notifier: Arc<NotificationService>,
    matches: RwLock<TrackedMatches>,
    on_update: parking_lot::Mutex<Option<MatchUpdateCallback>>,
    poll_interval: Duration,
    stopped: AtomicBool,
    shutdown: parking_lot::Mutex<Option<watch::Sender<bool>>>,
}

impl LiveMatchTracker {
    /// Create a new tracker
    pub fn new(
        source: Arc<dyn LiveScoreSource>,
        queue: Arc<EventQueue>,
        notifier: Arc<NotificationService>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            source,
            queue,
            notifier,
            matches: RwLock::new(TrackedMatches::new()),
            on_update: parking_lot::Mutex::new(None),
            poll_interval: config.poll_interval,
            stopped: AtomicBool::new(false),
            shutdown: parking_lot::Mutex::new(None),
        }
    }

    /// Poll now, then on every interval.
    ///
    /// Returns the loop's handle, or `None` if a tracking loop is already
    /// running or the poll interval is zero. A panic inside one poll is
    /// logged and the next tick still runs.
    pub fn start_tracking(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.poll_interval.is_zero() {
            warn!("Live tracking not started: poll interval is zero");
            return None;
        }

        let mut shutdown = self.shutdown.lock();
        if shutdown.is_some() {
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        *shutdown = Some(shutdown_tx);
        self.stopped.store(false, Ordering::SeqCst);

        let tracker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            info!("Live tracking started (interval: {:?})", tracker.poll_interval);

            // First tick completes immediately
            let mut interval = time::interval(tracker.poll_interval);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        let poll = tokio::spawn({
                            let tracker = Arc::clone(&tracker);
                            async move { tracker.track_matches().await }
                        });
                        if let Err(e) = poll.await {
                            error!("Live tracking poll failed: {}", e);
                        }
                    }
                }
            }

            info!("Live tracking stopped");
        });

        Some(handle)
    }

    /// Stop polling. A poll already in flight finishes but its result is
    /// discarded.
    pub fn stop_tracking(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(shutdown_tx) = self.shutdown.lock().take() {
            let _ = shutdown_tx.send(true);
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.shutdown.lock().is_some()
    }

    /// Run one poll-and-diff cycle
    pub async fn track_matches(&self) {
        let current = match self.source.fetch_live_matches().await {
            Ok(matches) => matches,
            Err(e) => {
                error!("Failed to fetch live matches: {:#}", e);
                return;
            }
        };

        if self.stopped.load(Ordering::SeqCst) {
            debug!("Tracking stopped, discarding poll result");
            return;
        }

        let events = {
            let mut tracked = self.matches.write().await;
            let mut events = Vec::new();

            for snapshot in &current {
                events.extend(detect_changes(tracked.get(&snapshot.id), snapshot));
                tracked.insert(snapshot.id.clone(), snapshot.clone());
            }

            let current_ids: HashSet<&MatchId> = current.iter().map(|m| &m.id).collect();
            let mut ended: Vec<MatchId> = tracked
                .keys()
                .filter(|id| !current_ids.contains(id))
                .cloned()
                .collect();
            ended.sort();

            for id in ended {
                if let Some(last) = tracked.remove(&id) {
                    events.push(MatchEvent::completed(last.context()));
                }
            }

            events
        };

        debug!(
            "Tracked {} live matches, {} new events",
            current.len(),
            events.len()
        );

        for event in &events {
            self.dispatch(event);
        }

        let callback = self.on_update.lock().clone();
        if let Some(callback) = callback {
            callback(&current);
        }
    }

    fn dispatch(&self, event: &MatchEvent) {
        let ctx = event.context();
        info!(
            "{} | Match {} | {} | {}'",
            event.kind().as_str(),
            ctx.id,
            ctx.score_line(),
            ctx.minute
        );

        self.queue.add_match_event(event);

        match event {
            MatchEvent::Goal { previous, current } => {
                self.notifier.show_score_change(previous, current);
            }
            MatchEvent::Halftime(ctx) => {
                self.notifier.show_halftime(ctx);
            }
            MatchEvent::Fulltime(ctx) | MatchEvent::MatchCompleted(ctx) => {
                self.notifier.show_fulltime(ctx);
            }
            MatchEvent::MatchStarted(_) => {}
        }
    }

    pub async fn get_match(&self, id: &MatchId) -> Option<MatchSnapshot> {
        self.matches.read().await.get(id).cloned()
    }

    pub async fn get_all_matches(&self) -> Vec<MatchSnapshot> {
        self.matches.read().await.values().cloned().collect()
    }

    /// Register the update callback, replacing any previous one
    pub fn set_on_match_update<F>(&self, callback: F)
    where
        F: Fn(&[MatchSnapshot]) + Send + Sync + 'static,
    {
        *self.on_update.lock() = Some(Arc::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::models::EventKind;
    use crate::notify::{LogPlatform, NotificationConfig};
    use crate::queue::QueueConfig;

    /// Replays scripted poll results; repeats the last one when exhausted
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<MatchSnapshot>>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<MatchSnapshot>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl LiveScoreSource for ScriptedSource {
        async fn fetch_live_matches(&self) -> Result<Vec<MatchSnapshot>> {
            *self.calls.lock() += 1;
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
            } else {
                match responses.front() {
                    Some(Ok(matches)) => Ok(matches.clone()),
                    Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn snapshot(id: i64, home: u32, away: u32, minute: &str) -> MatchSnapshot {
        MatchSnapshot {
            id: MatchId::from(id),
            home_team: "Roma".to_string(),
            away_team: "Lazio".to_string(),
            home_score: home,
            away_score: away,
            minute: minute.to_string(),
            status: None,
            competition_id: Some(4),
            competition_name: "Serie A".to_string(),
        }
    }

    async fn tracker_with(
        responses: Vec<Result<Vec<MatchSnapshot>>>,
    ) -> (Arc<LiveMatchTracker>, Arc<ScriptedSource>, Arc<EventQueue>, Arc<NotificationService>) {
        let source = Arc::new(ScriptedSource::new(responses));
        let queue = Arc::new(EventQueue::new(QueueConfig::default()));
        let notifier = Arc::new(NotificationService::new(
            Arc::new(LogPlatform::new()),
            NotificationConfig::default(),
        ));
        notifier.init().await;

        let tracker = Arc::new(LiveMatchTracker::new(
            source.clone(),
            Arc::clone(&queue),
            Arc::clone(&notifier),
            TrackerConfig::default(),
        ));

        (tracker, source, queue, notifier)
    }

    fn kinds(events: &[MatchEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind()).collect()
    }

    #[test]
    fn test_goal_and_halftime_in_same_tick() {
        let old = snapshot(1, 0, 0, "44");
        let new = snapshot(1, 1, 0, "45");

        let events = detect_changes(Some(&old), &new);
        assert_eq!(kinds(&events), vec![EventKind::Goal, EventKind::Halftime]);
    }

    #[test]
    fn test_fulltime_fires_once() {
        let events = detect_changes(Some(&snapshot(1, 2, 2, "89")), &snapshot(1, 2, 2, "90"));
        assert_eq!(kinds(&events), vec![EventKind::Fulltime]);

        let events = detect_changes(Some(&snapshot(1, 2, 2, "90")), &snapshot(1, 2, 2, "90"));
        assert!(events.is_empty());
    }

    #[test]
    fn test_minute_only_change_is_silent() {
        let events = detect_changes(Some(&snapshot(1, 0, 0, "12")), &snapshot(1, 0, 0, "13"));
        assert!(events.is_empty());
    }

    #[test]
    fn test_new_match_started_only_when_under_way() {
        assert!(detect_changes(None, &snapshot(1, 0, 0, "0")).is_empty());
        assert!(detect_changes(None, &snapshot(1, 0, 0, "NS")).is_empty());

        let events = detect_changes(None, &snapshot(1, 1, 0, "23"));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MatchEvent::MatchStarted(ctx) if ctx.minute == "23"));
    }

    #[tokio::test]
    async fn test_poll_diffs_against_previous_snapshot() {
        let (tracker, _source, queue, notifier) = tracker_with(vec![
            Ok(vec![snapshot(1, 0, 0, "44")]),
            Ok(vec![snapshot(1, 1, 0, "45")]),
        ])
        .await;

        tracker.track_matches().await;
        assert_eq!(queue.len(), 1); // match started

        tracker.track_matches().await;
        let items = queue.items();
        let queued: Vec<EventKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            queued,
            vec![EventKind::Goal, EventKind::Halftime, EventKind::Other]
        );

        let titles: Vec<String> = notifier.get_history().into_iter().map(|r| r.title).collect();
        assert_eq!(
            titles,
            vec![
                "⏸️ HALF TIME: Roma 1 - 0 Lazio".to_string(),
                "⚽ SCORE CHANGE! Roma 1 - 0 Lazio".to_string(),
            ]
        );

        let stored = tracker.get_match(&MatchId::from(1)).await.unwrap();
        assert_eq!(stored.minute, "45");
    }

    #[tokio::test]
    async fn test_vanished_match_completes_once() {
        let (tracker, _source, queue, notifier) = tracker_with(vec![
            Ok(vec![snapshot(1, 2, 1, "88"), snapshot(2, 0, 0, "0")]),
            Ok(vec![snapshot(2, 0, 0, "1")]),
            Ok(vec![snapshot(2, 0, 0, "2")]),
        ])
        .await;

        tracker.track_matches().await;
        queue.clear_queue();

        tracker.track_matches().await;
        let items = queue.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, EventKind::Other);
        assert_eq!(items[0].priority, 3);
        assert!(items[0].raw_message.starts_with("✅ *MATCH COMPLETED*"));
        assert_eq!(items[0].context.as_ref().unwrap().minute, "FT");

        assert!(tracker.get_match(&MatchId::from(1)).await.is_none());
        assert_eq!(tracker.get_all_matches().await.len(), 1);
        assert_eq!(notifier.get_history()[0].title, "✅ FULL TIME: Roma 2 - 1 Lazio");

        tracker.track_matches().await;
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_state_untouched() {
        let (tracker, _source, queue, _notifier) = tracker_with(vec![
            Ok(vec![snapshot(1, 0, 0, "10")]),
            Err(anyhow::anyhow!("connection refused")),
            Ok(vec![snapshot(1, 1, 0, "12")]),
        ])
        .await;

        let updates = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&updates);
        tracker.set_on_match_update(move |_| *counter.lock() += 1);

        tracker.track_matches().await;
        queue.clear_queue();

        tracker.track_matches().await;
        assert!(queue.is_empty());
        assert_eq!(*updates.lock(), 1);
        assert_eq!(tracker.get_all_matches().await.len(), 1);

        tracker.track_matches().await;
        assert_eq!(queue.items()[0].kind, EventKind::Goal);
        assert_eq!(*updates.lock(), 2);
    }

    #[tokio::test]
    async fn test_update_callback_last_writer_wins() {
        let (tracker, _source, _queue, _notifier) =
            tracker_with(vec![Ok(vec![snapshot(1, 0, 0, "5"), snapshot(2, 0, 0, "6")])]).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        tracker.set_on_match_update(|_| panic!("replaced callback must not run"));
        let sink = Arc::clone(&seen);
        tracker.set_on_match_update(move |matches| sink.lock().push(matches.len()));

        tracker.track_matches().await;
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracking_loop_polls_on_interval() {
        let (tracker, source, _queue, _notifier) =
            tracker_with(vec![Ok(vec![snapshot(1, 0, 0, "5")])]).await;

        let handle = tracker.start_tracking();
        assert!(handle.is_some());
        assert!(tracker.start_tracking().is_none());
        assert!(tracker.is_tracking());

        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 2);

        tracker.stop_tracking();
        assert!(!tracker.is_tracking());

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
        assert!(handle.is_some_and(|h| h.is_finished()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_listener_does_not_stop_polling() {
        let (tracker, source, queue, _notifier) =
            tracker_with(vec![Ok(vec![snapshot(1, 0, 0, "5")])]).await;

        let tripped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&tripped);
        queue.add_listener(move |_| {
            if !flag.swap(true, Ordering::SeqCst) {
                panic!("listener failure");
            }
        });

        let handle = tracker.start_tracking().unwrap();
        time::sleep(Duration::from_secs(35)).await;

        assert!(tripped.load(Ordering::SeqCst));
        assert_eq!(source.calls(), 4);
        assert!(tracker.is_tracking());
        assert!(!handle.is_finished());

        tracker.stop_tracking();
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_start() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let notifier = Arc::new(NotificationService::new(
            Arc::new(LogPlatform::new()),
            NotificationConfig::default(),
        ));
        let tracker = Arc::new(LiveMatchTracker::new(
            source,
            Arc::new(EventQueue::new(QueueConfig::default())),
            notifier,
            TrackerConfig {
                poll_interval: Duration::ZERO,
            },
        ));

        assert!(tracker.start_tracking().is_none());
        assert!(!tracker.is_tracking());
    }

    #[tokio::test]
    async fn test_stopped_tracker_discards_results() {
        let (tracker, _source, queue, _notifier) =
            tracker_with(vec![Ok(vec![snapshot(1, 0, 0, "5")])]).await;

        tracker.stop_tracking();
        tracker.track_matches().await;

        assert!(queue.is_empty());
        assert!(tracker.get_all_matches().await.is_empty());
    }
}
