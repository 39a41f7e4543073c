//! Parsing of the flattened poll line.
//!
//! The poll endpoint flattens whatever the server last said into one line:
//! chat messages come as `HH:MM:SS username: message`, roster changes as
//! `<name> joined` / `<name> left` with no timestamp. Usernames containing
//! `:` cannot be parsed unambiguously out of this format; the timestamp
//! prefix is what keeps a chat message whose text mentions "joined" from
//! being misread as a roster event.
use crate::client::models::events::RemoteEvent;
use chrono::{Local, TimeZone, Utc};

/// Parse one poll line into an event. Returns None for lines that match no
/// known shape; the poll loop skips those.
pub fn parse_poll_line(line: &str) -> Option<RemoteEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = strip_clock_prefix(line) {
        // Timestamped lines are always chat messages.
        let sent_at = clock_to_epoch(&line[..8]).unwrap_or_else(|| Utc::now().timestamp());
        return parse_chat_body(rest, sent_at);
    }

    // System lines carry no timestamp.
    if let Some(name) = line.strip_suffix(" joined") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(RemoteEvent::UserJoined { name: name.to_string() });
        }
    }
    if let Some(name) = line.strip_suffix(" left") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(RemoteEvent::UserLeft { name: name.to_string() });
        }
    }

    // Tolerate a chat line the server forgot to timestamp.
    parse_chat_body(line, Utc::now().timestamp())
}

fn parse_chat_body(body: &str, sent_at: i64) -> Option<RemoteEvent> {
    let (author, text) = body.split_once(':')?;
    let author = author.trim();
    let text = text.trim();
    if author.is_empty() || text.is_empty() {
        return None;
    }
    Some(RemoteEvent::NewMessage {
        author: author.to_string(),
        text: text.to_string(),
        sent_at,
    })
}

/// Strip a leading `HH:MM:SS ` clock and return the remainder.
fn strip_clock_prefix(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    if bytes.len() < 10 || bytes[8] != b' ' {
        return None;
    }
    for (i, b) in bytes[..8].iter().enumerate() {
        match i {
            2 | 5 => {
                if *b != b':' {
                    return None;
                }
            }
            _ => {
                if !b.is_ascii_digit() {
                    return None;
                }
            }
        }
    }
    Some(line[9..].trim_start())
}

/// Interpret a wall-clock `HH:MM:SS` as a moment of the current local day.
fn clock_to_epoch(clock: &str) -> Option<i64> {
    let mut parts = clock.splitn(3, ':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = parts.next()?.parse().ok()?;
    let today = Local::now().date_naive();
    let dt = today.and_hms_opt(h, m, s)?;
    Local
        .from_local_datetime(&dt)
        .single()
        .map(|local| local.timestamp())
}
