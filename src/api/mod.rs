pub mod livescores;

pub use livescores::{parse_live_matches, LiveScoreClient, LiveScoreSource};
