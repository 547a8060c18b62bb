pub mod event;
pub mod match_state;
pub mod notification;

pub use event::{EventKind, MatchContext, MatchEvent, QueueItem};
pub use match_state::{MatchId, MatchSnapshot, TrackedMatches};
pub use notification::{NotificationOptions, NotificationRecord, Permission};
