use chrono::{DateTime, Local, TimeZone, Utc};

/// Opaque message token, assigned client-side at creation.
/// Unique per session; used as the rendering key.
pub type MessageId = String;

pub fn fresh_message_id() -> MessageId {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Created by a local send, before any server confirmation.
    Local,
    /// Received from a transport.
    Remote,
}

/// Delivery lifecycle of a message. Mutated only by the sync engine:
/// Pending -> Confirmed on a matching echo, Pending -> Failed on transport
/// error or timeout. Never leaves Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub author: String,
    pub text: String,
    pub sent_at: i64,
    pub formatted_time: String,
    pub origin: Origin,
    pub delivery_state: DeliveryState,
}

impl ChatMessage {
    pub fn local(author: &str, text: &str) -> Self {
        let sent_at = Utc::now().timestamp();
        Self {
            id: fresh_message_id(),
            author: author.to_string(),
            text: text.to_string(),
            sent_at,
            formatted_time: format_timestamp(sent_at),
            origin: Origin::Local,
            delivery_state: DeliveryState::Pending,
        }
    }

    pub fn remote(author: &str, text: &str, sent_at: i64) -> Self {
        Self {
            id: fresh_message_id(),
            author: author.to_string(),
            text: text.to_string(),
            sent_at,
            formatted_time: format_timestamp(sent_at),
            origin: Origin::Remote,
            delivery_state: DeliveryState::Confirmed,
        }
    }
}

pub fn format_timestamp(timestamp: i64) -> String {
    let dt = Utc.timestamp_opt(timestamp, 0).single().unwrap_or_else(Utc::now);
    let local_dt: DateTime<Local> = dt.with_timezone(&Local);

    // Format as HH:MM:SS, the same shape the poll line carries
    local_dt.format("%H:%M:%S").to_string()
}
