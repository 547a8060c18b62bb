pub mod live_tracker;
pub mod queue_processor;

pub use live_tracker::{detect_changes, LiveMatchTracker, MatchUpdateCallback, TrackerConfig};
pub use queue_processor::QueueProcessorWorker;
