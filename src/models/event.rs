use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MatchId;

const RED_CARD_MARKER: &str = "🟥";
const YELLOW_CARD_MARKER: &str = "🟨";

/// Category of a queued event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    RedCard,
    YellowCard,
    Halftime,
    Fulltime,
    Penalty,
    Substitution,
    Other,
}

impl EventKind {
    /// Classify free text by keyword, first match wins.
    ///
    /// Case-sensitive. Only used for messages that did not come from the
    /// tracker's typed events.
    pub fn classify(message: &str) -> Self {
        if message.contains("GOAL") {
            EventKind::Goal
        } else if message.contains(RED_CARD_MARKER) {
            EventKind::RedCard
        } else if message.contains("FULL TIME") {
            EventKind::Fulltime
        } else if message.contains("HALF TIME") {
            EventKind::Halftime
        } else if message.contains(YELLOW_CARD_MARKER) {
            EventKind::YellowCard
        } else if message.contains("PENALTY") {
            EventKind::Penalty
        } else if message.contains("SUBSTITUTION") {
            EventKind::Substitution
        } else {
            EventKind::Other
        }
    }

    /// Delivery priority, higher is more urgent
    pub fn priority(&self) -> u8 {
        match self {
            EventKind::Goal => 10,
            EventKind::RedCard => 9,
            EventKind::Fulltime => 8,
            EventKind::Halftime => 7,
            EventKind::YellowCard => 6,
            EventKind::Penalty => 5,
            EventKind::Substitution => 4,
            EventKind::Other => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Goal => "goal",
            EventKind::RedCard => "red_card",
            EventKind::YellowCard => "yellow_card",
            EventKind::Halftime => "halftime",
            EventKind::Fulltime => "fulltime",
            EventKind::Penalty => "penalty",
            EventKind::Substitution => "substitution",
            EventKind::Other => "other",
        }
    }
}

/// Match fields copied onto each queued event for grouping and formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub id: MatchId,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub minute: String,
    pub competition: String,
    pub status: Option<String>,
}

impl MatchContext {
    /// "Home 1 - 0 Away"
    pub fn score_line(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.home_team, self.home_score, self.away_score, self.away_team
        )
    }

    fn with_minute(mut self, minute: &str) -> Self {
        self.minute = minute.to_string();
        self
    }
}

/// A domain event waiting in the queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    /// Unique item identifier
    pub id: String,

    /// Event category
    pub kind: EventKind,

    /// Message text as produced by the caller
    pub raw_message: String,

    /// Match this event belongs to, if known
    pub context: Option<MatchContext>,

    /// When the item was queued
    pub created_at: DateTime<Utc>,

    /// Copied from `kind` at insert time
    pub priority: u8,

    /// Set once the item has been folded into a digest
    pub delivered: bool,

    /// Digest the item was delivered in
    pub message: Option<String>,
}

impl QueueItem {
    pub fn match_id(&self) -> Option<&MatchId> {
        self.context.as_ref().map(|c| &c.id)
    }

    /// First line of the raw message
    pub fn headline(&self) -> &str {
        self.raw_message.lines().next().unwrap_or("")
    }
}

/// Event synthesized by diffing two snapshots of the same match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// Score changed between polls
    Goal {
        previous: MatchContext,
        current: MatchContext,
    },
    /// Minute reached 45
    Halftime(MatchContext),
    /// Minute reached 90
    Fulltime(MatchContext),
    /// First sighting of a match that is already under way
    MatchStarted(MatchContext),
    /// Match dropped out of the live list
    MatchCompleted(MatchContext),
}

impl MatchEvent {
    pub fn halftime(context: MatchContext) -> Self {
        MatchEvent::Halftime(context.with_minute("45"))
    }

    pub fn fulltime(context: MatchContext) -> Self {
        MatchEvent::Fulltime(context.with_minute("90"))
    }

    pub fn started(mut context: MatchContext) -> Self {
        context.home_score = 0;
        context.away_score = 0;
        MatchEvent::MatchStarted(context)
    }

    pub fn completed(context: MatchContext) -> Self {
        MatchEvent::MatchCompleted(context.with_minute("FT"))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            MatchEvent::Goal { .. } => EventKind::Goal,
            MatchEvent::Halftime(_) => EventKind::Halftime,
            MatchEvent::Fulltime(_) => EventKind::Fulltime,
            MatchEvent::MatchStarted(_) | MatchEvent::MatchCompleted(_) => EventKind::Other,
        }
    }

    pub fn context(&self) -> &MatchContext {
        match self {
            MatchEvent::Goal { current, .. } => current,
            MatchEvent::Halftime(ctx)
            | MatchEvent::Fulltime(ctx)
            | MatchEvent::MatchStarted(ctx)
            | MatchEvent::MatchCompleted(ctx) => ctx,
        }
    }

    /// Shareable message text for this event
    pub fn render(&self) -> String {
        match self {
            MatchEvent::Goal { current, .. } => format!(
                "⚽ *GOAL!*\n\n🏟️ {}\n⏱️ {}'\n\n#Goal #LiveFootball",
                current.score_line(),
                current.minute
            ),
            MatchEvent::Halftime(ctx) => format!(
                "⏸️ *HALF TIME*\n\n🏟️ {}\n\n⏱️ 45' - First half complete\n\n#Halftime #Football",
                ctx.score_line()
            ),
            MatchEvent::Fulltime(ctx) => format!(
                "✅ *FULL TIME*\n\n🏟️ {}\n\n⏱️ Full time result\n\n#FullTime #Result",
                ctx.score_line()
            ),
            MatchEvent::MatchStarted(ctx) => format!(
                "🔴 *MATCH STARTED*\n\n🏟️ {} vs {}\n⏱️ Kickoff at {}'\n\n#LiveFootball #Kickoff",
                ctx.home_team, ctx.away_team, ctx.minute
            ),
            MatchEvent::MatchCompleted(ctx) => format!(
                "✅ *MATCH COMPLETED*\n\n🏟️ {}\n\n⏱️ Full time result\n\n#FinalScore #Football",
                ctx.score_line()
            ),
        }
    }
}
