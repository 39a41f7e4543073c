use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::client::models::events::RemoteEvent;
use crate::client::services::sync_engine::EngineInput;
use crate::common::protocol::{
    ConnectedFrame, NewMessageFrame, SystemMessageFrame, UserJoinFrame, UserJoinedFrame,
    UserListUpdateFrame,
};

/// Commands from the engine to the channel controller. The engine guards
/// re-entrancy (one attempt at a time) via its ConnectionState, so the
/// controller just executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCommand {
    Connect,
}

/// How a connection ended.
#[derive(Debug, Clone)]
enum CloseReason {
    /// Server sent a Close frame: deliberate, do not reconnect.
    ByServer,
    /// Anything else (connect failure, read error, silent EOF).
    Other(String),
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::ByServer => write!(f, "closed by server"),
            CloseReason::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Push variant of the transport: a websocket carrying JSON text frames
/// tagged by `message_type`. Inbound only, except for the `user_join`
/// announcement sent as the first action after the channel opens — chat
/// sends go through the HTTP primitive shared with the poll variant.
pub struct PushChannel {
    url: String,
    username: String,
    events_tx: mpsc::UnboundedSender<EngineInput>,
}

impl PushChannel {
    pub fn new(
        url: &str,
        username: &str,
        events_tx: mpsc::UnboundedSender<EngineInput>,
    ) -> anyhow::Result<Self> {
        Url::parse(url)?;
        Ok(Self {
            url: url.to_string(),
            username: username.to_string(),
            events_tx,
        })
    }

    /// Spawn the controller task: one connection per `Connect` command,
    /// open/close reported to the engine, parsed frames forwarded inward.
    pub fn spawn(self, mut commands: mpsc::UnboundedReceiver<PushCommand>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(PushCommand::Connect) = commands.recv().await {
                let reason = self.run_connection().await;
                log::info!("[PUSH] connection ended: {}", reason);
                let closed = EngineInput::ChannelClosed {
                    by_server: matches!(reason, CloseReason::ByServer),
                    reason: reason.to_string(),
                };
                if self.events_tx.send(closed).is_err() {
                    break; // engine gone, session tearing down
                }
            }
            log::debug!("[PUSH] controller stopped");
        })
    }

    async fn run_connection(&self) -> CloseReason {
        log::info!("[PUSH] connecting to {}", self.url);
        let (ws_stream, _) = match connect_async(self.url.as_str()).await {
            Ok(conn) => conn,
            Err(e) => return CloseReason::Other(format!("connect failed: {}", e)),
        };
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // Announce ourselves before anything else.
        let join = match serde_json::to_string(&UserJoinFrame::new(&self.username)) {
            Ok(json) => json,
            Err(e) => return CloseReason::Other(format!("user_join serialization: {}", e)),
        };
        if let Err(e) = ws_sender.send(Message::Text(join)).await {
            return CloseReason::Other(format!("user_join send failed: {}", e));
        }

        if self.events_tx.send(EngineInput::ChannelOpened).is_err() {
            return CloseReason::Other("engine gone".to_string());
        }

        while let Some(frame) = ws_receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_push_frame(&text) {
                    Ok(event) => {
                        if self.events_tx.send(EngineInput::Remote(event)).is_err() {
                            return CloseReason::Other("engine gone".to_string());
                        }
                    }
                    Err(e) => {
                        // best-effort, like the poll path: skip and keep reading
                        log::warn!("[PUSH] skipping frame: {} - raw: {}", e, text);
                    }
                },
                Ok(Message::Close(_)) => return CloseReason::ByServer,
                Ok(_) => {} // binary/ping/pong: ignored
                Err(e) => return CloseReason::Other(format!("websocket error: {}", e)),
            }
        }
        CloseReason::Other("connection ended".to_string())
    }
}

/// Decode one inbound frame. Dispatch on `message_type`, then parse the
/// matching typed struct.
fn parse_push_frame(text: &str) -> Result<RemoteEvent, String> {
    let generic: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))?;
    let message_type = generic
        .get("message_type")
        .and_then(|v| v.as_str())
        .ok_or("missing message_type field")?;

    match message_type {
        "connected" => {
            let frame: ConnectedFrame = serde_json::from_str(text)
                .map_err(|e| format!("bad connected frame: {}", e))?;
            Ok(RemoteEvent::SystemMessage { text: frame.message })
        }
        "new_message" => {
            let frame: NewMessageFrame = serde_json::from_str(text)
                .map_err(|e| format!("bad new_message frame: {}", e))?;
            Ok(RemoteEvent::NewMessage {
                author: frame.username,
                text: frame.text,
                // the push frame carries no timestamp; stamp at receipt
                sent_at: Utc::now().timestamp(),
            })
        }
        "user_list_update" => {
            let frame: UserListUpdateFrame = serde_json::from_str(text)
                .map_err(|e| format!("bad user_list_update frame: {}", e))?;
            Ok(RemoteEvent::RosterSnapshot { names: frame.users })
        }
        "user_joined" => {
            let frame: UserJoinedFrame = serde_json::from_str(text)
                .map_err(|e| format!("bad user_joined frame: {}", e))?;
            Ok(RemoteEvent::UserJoined { name: frame.username })
        }
        "system_message" => {
            let frame: SystemMessageFrame = serde_json::from_str(text)
                .map_err(|e| format!("bad system_message frame: {}", e))?;
            Ok(RemoteEvent::SystemMessage { text: frame.message })
        }
        other => Err(format!("unknown message type: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_new_message_frame() {
        let raw = r#"{"message_type":"new_message","username":"alice","text":"hello"}"#;
        match parse_push_frame(raw).unwrap() {
            RemoteEvent::NewMessage { author, text, .. } => {
                assert_eq!(author, "alice");
                assert_eq!(text, "hello");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_roster_and_join_frames() {
        let raw = r#"{"message_type":"user_list_update","users":["Alex","Sam"]}"#;
        assert_eq!(
            parse_push_frame(raw).unwrap(),
            RemoteEvent::RosterSnapshot { names: vec!["Alex".to_string(), "Sam".to_string()] }
        );

        let raw = r#"{"message_type":"user_joined","username":"Alex"}"#;
        assert_eq!(
            parse_push_frame(raw).unwrap(),
            RemoteEvent::UserJoined { name: "Alex".to_string() }
        );
    }

    #[test]
    fn greeting_and_system_frames_become_notifications() {
        let raw = r#"{"message_type":"connected","message":"welcome"}"#;
        assert_eq!(
            parse_push_frame(raw).unwrap(),
            RemoteEvent::SystemMessage { text: "welcome".to_string() }
        );

        let raw = r#"{"message_type":"system_message","message":"maintenance"}"#;
        assert_eq!(
            parse_push_frame(raw).unwrap(),
            RemoteEvent::SystemMessage { text: "maintenance".to_string() }
        );
    }

    #[test]
    fn rejects_unknown_or_malformed_frames() {
        assert!(parse_push_frame("not json").is_err());
        assert!(parse_push_frame(r#"{"no_type":true}"#).is_err());
        assert!(parse_push_frame(r#"{"message_type":"presence_ping"}"#).is_err());
        assert!(parse_push_frame(r#"{"message_type":"new_message","username":"a"}"#).is_err());
    }

    #[test]
    fn user_join_frame_round_trips() {
        let json = serde_json::to_string(&UserJoinFrame::new("me")).unwrap();
        assert!(json.contains(r#""message_type":"user_join""#));
        assert!(json.contains(r#""username":"me""#));
    }
}
