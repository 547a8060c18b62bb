//! Digest text for a group of queued events from the same match

use std::fmt::Write;

use crate::models::{EventKind, QueueItem};

/// Build one shareable message for a group of events.
///
/// The first member's match context drives the header and score line. A
/// group without match context falls back to the first raw message.
pub fn format_group(members: &[&QueueItem]) -> String {
    let Some(first) = members.first() else {
        return String::new();
    };

    let Some(ctx) = first.context.as_ref() else {
        return first.raw_message.clone();
    };

    let minute = if ctx.minute.is_empty() { "0" } else { &ctx.minute };
    let status = ctx.status.as_deref().unwrap_or("In Progress");

    let mut message = String::new();
    let _ = writeln!(message, "🔴 *LIVE: {} vs {}*", ctx.home_team, ctx.away_team);
    let _ = writeln!(message, "⏱️ {}' - {}\n", minute, status);

    write_section(&mut message, members, EventKind::Goal, "⚽ *GOAL", "!*");
    write_section(&mut message, members, EventKind::RedCard, "🟥 *RED CARD", "!*");
    write_section(&mut message, members, EventKind::YellowCard, "🟨 *YELLOW CARD", "*");

    let _ = writeln!(message, "📊 *Score:* {} - {}", ctx.home_score, ctx.away_score);
    let _ = write!(message, "#LiveFootball #{}", competition_hashtag(&ctx.competition));

    message
}

fn write_section(
    message: &mut String,
    members: &[&QueueItem],
    kind: EventKind,
    heading: &str,
    suffix: &str,
) {
    let lines: Vec<&str> = members
        .iter()
        .filter(|item| item.kind == kind)
        .map(|item| item.headline())
        .collect();

    if lines.is_empty() {
        return;
    }

    let plural = if lines.len() > 1 { "S" } else { "" };
    let _ = writeln!(message, "{heading}{plural}{suffix}");
    for line in lines {
        let _ = writeln!(message, "{line}");
    }
    message.push('\n');
}

/// Competition name with all whitespace removed, "Match" when empty
pub fn competition_hashtag(competition: &str) -> String {
    let tag: String = competition.chars().filter(|c| !c.is_whitespace()).collect();
    if tag.is_empty() {
        "Match".to_string()
    } else {
        tag
    }
}
