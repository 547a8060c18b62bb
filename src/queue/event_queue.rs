use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::models::{EventKind, MatchContext, MatchEvent, MatchId, QueueItem};
use crate::queue::digest;

/// Event queue settings
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum pending items; lowest priority overflow is dropped
    pub capacity: usize,

    /// Items of one match closer together than this share a digest
    pub group_window: Duration,

    /// How often the processing worker drains the queue
    pub process_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            group_window: Duration::from_secs(30),
            process_interval: Duration::from_secs(2),
        }
    }
}

/// Events from the same match delivered as one digest
#[derive(Debug, Clone, Serialize)]
pub struct EventGroup {
    items: Vec<QueueItem>,
    message: String,
}

impl EventGroup {
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn match_id(&self) -> Option<&MatchId> {
        self.items.first().and_then(|item| item.match_id())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What a queue listener is told about
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Added(QueueItem),
    Processed(EventGroup),
    Cleared,
}

impl QueueEvent {
    pub fn action(&self) -> &'static str {
        match self {
            QueueEvent::Added(_) => "added",
            QueueEvent::Processed(_) => "processed",
            QueueEvent::Cleared => "cleared",
        }
    }
}

/// Per-kind counts reported by [`EventQueue::get_stats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub goal: usize,
    pub red_card: usize,
    pub yellow_card: usize,
    pub halftime: usize,
    pub fulltime: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub by_type: KindCounts,
    pub highest_priority: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&QueueEvent) + Send + Sync>;

struct QueueState {
    items: Vec<QueueItem>,
    auto_process: bool,
}

/// Priority-ordered, bounded buffer of pending match events
pub struct EventQueue {
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
}

impl EventQueue {
    /// Create a queue backed by the system clock
    pub fn new(config: QueueConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(QueueState {
                items: Vec::new(),
                auto_process: true,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Queue free text, classifying it by keyword
    pub fn add_event(
        &self,
        raw_message: impl Into<String>,
        context: Option<MatchContext>,
    ) -> QueueItem {
        let raw_message = raw_message.into();
        let kind = EventKind::classify(&raw_message);
        self.insert(kind, raw_message, context)
    }

    /// Queue a typed event from the tracker
    pub fn add_match_event(&self, event: &MatchEvent) -> QueueItem {
        self.insert(event.kind(), event.render(), Some(event.context().clone()))
    }

    fn insert(
        &self,
        kind: EventKind,
        raw_message: String,
        context: Option<MatchContext>,
    ) -> QueueItem {
        let created_at = self.clock.now();
        let item = QueueItem {
            id: format!("{}-{}", created_at.timestamp_millis(), Uuid::new_v4().simple()),
            kind,
            raw_message,
            context,
            created_at,
            priority: kind.priority(),
            delivered: false,
            message: None,
        };

        {
            let mut state = self.state.lock();
            state.items.push(item.clone());
            // stable: equal priorities keep insertion order
            state.items.sort_by(|a, b| b.priority.cmp(&a.priority));
            state.items.truncate(self.config.capacity);
        }

        debug!("Event queued: {} - priority {}", kind.as_str(), item.priority);
        self.notify(&QueueEvent::Added(item.clone()));
        item
    }

    /// Fold pending items into per-match digests and deliver them.
    ///
    /// Returns the delivered groups; empty when auto-processing is off or
    /// nothing is pending.
    pub fn process_queue(&self) -> Vec<EventGroup> {
        let groups = {
            let mut state = self.state.lock();
            if !state.auto_process || state.items.is_empty() {
                return Vec::new();
            }

            let partition = group_events(&state.items, self.config.group_window);
            let mut groups = Vec::with_capacity(partition.len());

            for indices in partition {
                let members: Vec<&QueueItem> = indices.iter().map(|&i| &state.items[i]).collect();
                let message = digest::format_group(&members);

                for &i in &indices {
                    let item = &mut state.items[i];
                    item.delivered = true;
                    item.message = Some(message.clone());
                }

                groups.push(EventGroup {
                    items: indices.iter().map(|&i| state.items[i].clone()).collect(),
                    message,
                });
            }

            state.items.retain(|item| !item.delivered);
            groups
        };

        debug!("Processed {} event group(s)", groups.len());
        for group in &groups {
            self.notify(&QueueEvent::Processed(group.clone()));
        }
        groups
    }

    pub fn get_stats(&self) -> QueueStats {
        let state = self.state.lock();
        let mut by_type = KindCounts::default();

        for item in &state.items {
            match item.kind {
                EventKind::Goal => by_type.goal += 1,
                EventKind::RedCard => by_type.red_card += 1,
                EventKind::YellowCard => by_type.yellow_card += 1,
                EventKind::Halftime => by_type.halftime += 1,
                EventKind::Fulltime => by_type.fulltime += 1,
                _ => {}
            }
        }

        QueueStats {
            total: state.items.len(),
            by_type,
            highest_priority: state.items.first().map(|i| i.priority).unwrap_or(0),
        }
    }

    pub fn clear_queue(&self) {
        self.state.lock().items.clear();
        info!("Event queue cleared");
        self.notify(&QueueEvent::Cleared);
    }

    pub fn toggle_auto_process(&self, enabled: bool) {
        self.state.lock().auto_process = enabled;
        info!("Queue auto-processing {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_auto_processing(&self) -> bool {
        self.state.lock().auto_process
    }

    /// Pending items, highest priority first
    pub fn items(&self) -> Vec<QueueItem> {
        self.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Register a callback run synchronously for every queue event, in
    /// registration order
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the listener was already gone
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn notify(&self, event: &QueueEvent) {
        // Snapshot so callbacks may re-enter the queue
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

/// Partition queue positions into delivery groups.
///
/// Greedy single pass: each ungrouped item opens a group and pulls in every
/// later ungrouped item with the same match id created less than `window`
/// away from it. Items are never reconsidered once grouped.
pub fn group_events(items: &[QueueItem], window: Duration) -> Vec<Vec<usize>> {
    let window_ms = window.as_millis() as i64;
    let mut grouped = vec![false; items.len()];
    let mut groups = Vec::new();

    for i in 0..items.len() {
        if grouped[i] {
            continue;
        }
        grouped[i] = true;

        let seed = &items[i];
        let mut group = vec![i];

        for j in (i + 1)..items.len() {
            if grouped[j] {
                continue;
            }

            let other = &items[j];
            let gap_ms = (other.created_at - seed.created_at).num_milliseconds().abs();

            if other.match_id() == seed.match_id() && gap_ms < window_ms {
                group.push(j);
                grouped[j] = true;
            }
        }

        groups.push(group);
    }

    groups
}
