//! Shareable text for the messaging hand-off.
//!
//! Digests delivered by the queue are kept in a small feed so they can be
//! bundled into one message and turned into a pre-filled compose link.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::models::MatchSnapshot;

const SHARE_BASE_URL: &str = "https://wa.me/?text=";

/// Most recent digests, newest first
pub struct EventFeed {
    capacity: usize,
    entries: Mutex<VecDeque<String>>,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        let mut entries = self.entries.lock();
        entries.push_front(message.into());
        entries.truncate(self.capacity);
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Bundle digests into one message, `None` when there is nothing to share
pub fn live_events_digest(messages: &[String], date: NaiveDate) -> Option<String> {
    if messages.is_empty() {
        return None;
    }

    let mut message = format!(
        "⚡ *LIVE MATCH EVENTS* ⚡\n📅 {}\n\n",
        date.format("%-d %B %Y")
    );

    for (i, event) in messages.iter().enumerate() {
        message.push_str(event);
        message.push('\n');
        if i + 1 < messages.len() {
            message.push_str("---\n");
        }
    }

    Some(message)
}

/// One-off score message for a single live match
pub fn live_score_message(snapshot: &MatchSnapshot, now: DateTime<Utc>) -> String {
    format!(
        "⚽ *LIVE SCORE*\n🏆 {}\n🏟️ {} {} - {} {}\n📅 {} · {}\n#LiveFootball #Scores",
        snapshot.competition_name,
        snapshot.home_team,
        snapshot.home_score,
        snapshot.away_score,
        snapshot.away_team,
        now.format("%-d %b"),
        now.format("%H:%M"),
    )
}

/// Pre-filled compose link for the messaging service
pub fn share_url(message: &str) -> String {
    format!("{}{}", SHARE_BASE_URL, urlencoding::encode(message))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::MatchId;

    #[test]
    fn test_feed_keeps_newest() {
        let feed = EventFeed::new(2);
        feed.push("a");
        feed.push("b");
        feed.push("c");

        assert_eq!(feed.messages(), vec!["c", "b"]);
        feed.clear();
        assert!(feed.is_empty());
    }

    #[test]
    fn test_live_events_digest() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(live_events_digest(&[], date), None);

        let digest = live_events_digest(&["one".to_string(), "two".to_string()], date).unwrap();
        assert_eq!(
            digest,
            "⚡ *LIVE MATCH EVENTS* ⚡\n📅 9 March 2024\n\none\n---\ntwo\n"
        );
    }

    #[test]
    fn test_live_score_message() {
        let snapshot = MatchSnapshot {
            id: MatchId::from(3),
            home_team: "Celtic".to_string(),
            away_team: "Rangers".to_string(),
            home_score: 3,
            away_score: 2,
            minute: "81".to_string(),
            status: None,
            competition_id: None,
            competition_name: "Premiership".to_string(),
        };
        let now = Utc.with_ymd_and_hms(2024, 12, 29, 14, 5, 0).unwrap();

        assert_eq!(
            live_score_message(&snapshot, now),
            "⚽ *LIVE SCORE*\n🏆 Premiership\n🏟️ Celtic 3 - 2 Rangers\n📅 29 Dec · 14:05\n#LiveFootball #Scores"
        );
    }

    #[test]
    fn test_share_url_encodes_message() {
        assert_eq!(
            share_url("Goal! 1 - 0\n#Derby"),
            "https://wa.me/?text=Goal%21%201%20-%200%0A%23Derby"
        );
    }
}
