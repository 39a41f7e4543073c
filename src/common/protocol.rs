//! Wire formats shared by both transports.
//!
//! The chat server exposes two inbound paths (websocket push, HTTP poll)
//! and a single outbound path (`POST /send`) used regardless of which
//! inbound channel is active.
use serde::{Serialize, Deserialize};

/// Body of `POST /send`. Any 2xx response means accepted; no body required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub username: String,
    pub text: String,
}

/// Error body returned by `/send` on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendErrorBody {
    pub error: String,
}

/// Response of `GET /poll`: the single most recent formatted chat line.
/// The field is absent (or empty) until the server has said anything;
/// an unchanged value means "nothing new since your last poll".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub text: Option<String>,
}

// Push-channel frames. JSON text frames tagged by `message_type`, parsed
// by value + per-variant from_str in the push channel.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedFrame {
    pub message_type: String, // "connected"
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageFrame {
    pub message_type: String, // "new_message"
    pub username: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListUpdateFrame {
    pub message_type: String, // "user_list_update"
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJoinedFrame {
    pub message_type: String, // "user_joined"
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessageFrame {
    pub message_type: String, // "system_message"
    pub message: String,
}

/// Client -> server announcement, the first frame after the channel opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJoinFrame {
    pub message_type: String, // "user_join"
    pub username: String,
}

impl UserJoinFrame {
    pub fn new(username: &str) -> Self {
        Self {
            message_type: "user_join".to_string(),
            username: username.to_string(),
        }
    }
}
