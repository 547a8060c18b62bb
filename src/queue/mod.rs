pub mod digest;
pub mod event_queue;

pub use event_queue::{
    group_events, EventGroup, EventQueue, KindCounts, ListenerId, QueueConfig, QueueEvent,
    QueueStats,
};
