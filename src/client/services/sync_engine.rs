use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tokio::time::Duration;

use crate::client::config::ClientConfig;
use crate::client::models::events::{ConnectionState, Notice, RemoteEvent};
use crate::client::models::message::{ChatMessage, DeliveryState, MessageId};
use crate::client::services::http_api::SendError;
use crate::client::services::pending::PendingSet;
use crate::client::services::push_channel::PushCommand;
use crate::client::services::roster::Roster;
use crate::client::ui::Renderer;
use crate::client::utils::task::ScheduledTask;

/// The engine's input alphabet. Transports, timers and the front-end only
/// ever enqueue these; the engine task consumes them one at a time, so every
/// handler runs to completion before the next event is looked at.
#[derive(Debug)]
pub enum EngineInput {
    /// User typed a message.
    SendText(String),
    /// A transport produced a server event.
    Remote(RemoteEvent),
    /// Outcome of the `POST /send` dispatched for a local message.
    SendResult { id: MessageId, result: Result<(), SendError> },
    /// The pending timeout elapsed for a local message.
    PendingExpired { id: MessageId },
    /// The push channel finished its open handshake.
    ChannelOpened,
    /// The push channel went away. `by_server` distinguishes a deliberate
    /// server-side close (terminal) from any other loss (retryable).
    ChannelClosed { by_server: bool, reason: String },
    /// Reconnect backoff elapsed.
    ReconnectDue,
    /// The front-end wants the current roster re-emitted.
    ShowRoster,
}

/// One outbound send, queued for the HTTP worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub id: MessageId,
    pub username: String,
    pub text: String,
}

/// The message-delivery synchronization core.
///
/// Owns the optimistic-send / dedup / failure state machine, the roster and
/// the push-channel connection state, and drives the renderer. All shared
/// state is mutated here and only here; the transports report events inward
/// and never touch it directly.
pub struct SyncEngine {
    local_user: String,
    max_message_length: usize,
    sound_enabled: bool,
    pending_timeout: Duration,
    reconnect_base_delay: Duration,
    max_reconnect_attempts: u32,
    renderer: Box<dyn Renderer>,
    roster: Roster,
    pending: PendingSet,
    /// Authoritative delivery state per message id.
    messages: HashMap<MessageId, ChatMessage>,
    connection: ConnectionState,
    reconnect_attempts: u32,
    reload_notified: bool,
    reconnect_timer: Option<ScheduledTask>,
    /// Loopback for timers (pending timeout, reconnect backoff).
    events_tx: mpsc::UnboundedSender<EngineInput>,
    /// Queue drained by the HTTP send worker.
    outbound_tx: mpsc::UnboundedSender<SendRequest>,
    /// Commands to the push-channel controller.
    push_tx: mpsc::UnboundedSender<PushCommand>,
    /// Mirror of `connection` observed by the poll loop.
    state_tx: watch::Sender<ConnectionState>,
}

impl SyncEngine {
    pub fn new(
        config: &ClientConfig,
        renderer: Box<dyn Renderer>,
        events_tx: mpsc::UnboundedSender<EngineInput>,
        outbound_tx: mpsc::UnboundedSender<SendRequest>,
        push_tx: mpsc::UnboundedSender<PushCommand>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            local_user: config.username.clone(),
            max_message_length: config.max_message_length,
            sound_enabled: config.sound_enabled,
            pending_timeout: config.pending_timeout,
            reconnect_base_delay: config.reconnect_base_delay,
            max_reconnect_attempts: config.max_reconnect_attempts,
            renderer,
            roster: Roster::new(&config.username),
            pending: PendingSet::new(),
            messages: HashMap::new(),
            connection: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            reload_notified: false,
            reconnect_timer: None,
            events_tx,
            outbound_tx,
            push_tx,
            state_tx,
        }
    }

    /// Consume the input queue until the session tears it down.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<EngineInput>) {
        while let Some(input) = inputs.recv().await {
            self.handle_input(input);
        }
        log::debug!("[SYNC] input queue closed, engine stopped");
    }

    /// Kick off the first push-channel connection attempt.
    pub fn start(&mut self) {
        self.renderer
            .notify(Notice::info("Welcome to the chat! Start connecting with others."));
        if self.connection == ConnectionState::Disconnected {
            self.to_connecting();
        }
    }

    pub fn handle_input(&mut self, input: EngineInput) {
        match input {
            EngineInput::SendText(text) => {
                self.send_local(&text);
            }
            EngineInput::Remote(event) => self.on_remote_event(event),
            EngineInput::SendResult { id, result } => self.on_send_result(id, result),
            EngineInput::PendingExpired { id } => self.on_pending_expired(id),
            EngineInput::ChannelOpened => self.on_channel_opened(),
            EngineInput::ChannelClosed { by_server, reason } => {
                self.on_channel_closed(by_server, &reason)
            }
            EngineInput::ReconnectDue => self.on_reconnect_due(),
            EngineInput::ShowRoster => {
                let names = self.roster.names_sorted();
                self.renderer.roster_changed(&names);
            }
        }
    }

    /// Optimistic send: render immediately, register as pending with a
    /// timeout timer, queue the POST. Returns the fresh id, or None when the
    /// input was empty or over the length limit (nothing happens then).
    pub fn send_local(&mut self, text: &str) -> Option<MessageId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        // Limite lunghezza messaggio
        if text.len() > self.max_message_length {
            self.renderer.notify(Notice::error(format!(
                "Message too long (max {} characters)",
                self.max_message_length
            )));
            return None;
        }

        let message = ChatMessage::local(&self.local_user, text);
        let id = message.id.clone();
        self.renderer.render(&message);
        self.messages.insert(id.clone(), message);

        let timeout = ScheduledTask::once(
            self.pending_timeout,
            self.events_tx.clone(),
            EngineInput::PendingExpired { id: id.clone() },
        );
        self.pending.register(id.clone(), text.to_string(), timeout);

        // Both transport variants share the same outbound call.
        let request = SendRequest {
            id: id.clone(),
            username: self.local_user.clone(),
            text: text.to_string(),
        };
        if self.outbound_tx.send(request).is_err() {
            log::error!("[SYNC] send worker gone, failing message immediately");
            self.fail_message(&id, Notice::error("Failed to send message. Please try again."));
            return Some(id);
        }
        log::debug!("[SYNC] queued send {} ({} bytes)", id, text.len());
        Some(id)
    }

    fn on_send_result(&mut self, id: MessageId, result: Result<(), SendError>) {
        match result {
            // Accepted by the bridge; confirmation still comes from the echo.
            Ok(()) => log::debug!("[SYNC] send {} accepted", id),
            Err(e) => {
                log::warn!("[SYNC] send {} failed: {}", id, e);
                self.fail_message(&id, Notice::error(format!("Failed to send message: {}", e)));
            }
        }
    }

    fn on_pending_expired(&mut self, id: MessageId) {
        // A stale timer (already confirmed or failed) is ignored.
        if !self.pending.contains(&id) {
            return;
        }
        log::warn!("[SYNC] no echo for {} within {:?}", id, self.pending_timeout);
        self.fail_message(
            &id,
            Notice::error("Failed to send message: no confirmation from the server"),
        );
    }

    /// Terminal Pending -> Failed transition. Exactly once per message: the
    /// pending entry (and with it the timeout timer) is removed first, and a
    /// message already past Pending is left alone.
    fn fail_message(&mut self, id: &MessageId, notice: Notice) {
        let _entry = self.pending.take(id);
        let message = match self.messages.get_mut(id) {
            Some(m) => m,
            None => return,
        };
        if message.delivery_state != DeliveryState::Pending {
            return;
        }
        message.delivery_state = DeliveryState::Failed;
        self.renderer.mark_failed(id);
        self.renderer.notify(notice);
    }

    pub fn on_remote_event(&mut self, event: RemoteEvent) {
        match event {
            RemoteEvent::NewMessage { author, text, sent_at } => {
                if author == self.local_user {
                    // Echo matching is by text: the server does not round-trip
                    // the client id. Oldest pending entry with this text wins,
                    // keeping confirmations in send order.
                    if let Some(entry) = self.pending.confirm_oldest(&text) {
                        if let Some(message) = self.messages.get_mut(&entry.id) {
                            message.delivery_state = DeliveryState::Confirmed;
                        }
                        log::debug!("[SYNC] echo confirmed {}", entry.id);
                        return; // already rendered optimistically
                    }
                }
                let message = ChatMessage::remote(&author, &text, sent_at);
                self.renderer.render(&message);
                if self.sound_enabled && author != self.local_user {
                    self.renderer.sound_cue();
                }
                self.messages.insert(message.id.clone(), message);
            }
            RemoteEvent::RosterSnapshot { names } => {
                if self.roster.set_all(names) {
                    let names = self.roster.names_sorted();
                    self.renderer.roster_changed(&names);
                }
            }
            RemoteEvent::UserJoined { name } => {
                if self.roster.add(&name) {
                    let names = self.roster.names_sorted();
                    self.renderer.roster_changed(&names);
                    self.renderer.notify(Notice::info(format!("{} joined the chat", name)));
                }
            }
            RemoteEvent::UserLeft { name } => {
                if self.roster.remove(&name) {
                    let names = self.roster.names_sorted();
                    self.renderer.roster_changed(&names);
                    self.renderer.notify(Notice::info(format!("{} left the chat", name)));
                }
            }
            RemoteEvent::SystemMessage { text } => {
                // Pass-through: no message or roster state involved.
                self.renderer.notify(Notice::info(text));
            }
        }
    }

    fn on_channel_opened(&mut self) {
        self.reconnect_attempts = 0;
        self.reconnect_timer = None;
        self.set_connection(ConnectionState::Connected);
        log::info!("[SYNC] push channel up");
    }

    fn on_channel_closed(&mut self, by_server: bool, reason: &str) {
        if self.connection == ConnectionState::Disconnected {
            return; // stale report from an already-abandoned connection
        }
        self.set_connection(ConnectionState::Disconnected);

        if by_server {
            // Deliberate close: no automatic reconnect.
            self.reconnect_timer = None;
            log::info!("[SYNC] push channel closed by server: {}", reason);
            self.renderer.notify(Notice::warning(
                "The server closed the live connection; staying on polling",
            ));
            return;
        }

        self.reconnect_attempts += 1;
        if self.reconnect_attempts > self.max_reconnect_attempts {
            self.reconnect_timer = None;
            if !self.reload_notified {
                self.reload_notified = true;
                log::error!("[SYNC] reconnect attempts exhausted ({})", reason);
                self.renderer.notify(Notice::error(
                    "Connection lost and could not be re-established; restart the client",
                ));
            }
            return;
        }

        let delay = self.reconnect_base_delay * self.reconnect_attempts;
        log::info!(
            "[SYNC] push channel lost ({}), retry {}/{} in {:?}",
            reason,
            self.reconnect_attempts,
            self.max_reconnect_attempts,
            delay
        );
        self.reconnect_timer = Some(ScheduledTask::once(
            delay,
            self.events_tx.clone(),
            EngineInput::ReconnectDue,
        ));
    }

    fn on_reconnect_due(&mut self) {
        // Guard against re-entrancy and stale timers: never start an attempt
        // while one is in flight, connected, or after giving up.
        if self.reload_notified || self.connection != ConnectionState::Disconnected {
            return;
        }
        self.to_connecting();
    }

    fn to_connecting(&mut self) {
        self.set_connection(ConnectionState::Connecting);
        if self.push_tx.send(PushCommand::Connect).is_err() {
            log::warn!("[SYNC] push controller gone; polling stays primary");
            self.set_connection(ConnectionState::Disconnected);
        }
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection == state {
            return;
        }
        self.connection = state;
        let _ = self.state_tx.send(state);
        self.renderer.connection_changed(state);
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    pub fn delivery_state(&self, id: &MessageId) -> Option<DeliveryState> {
        self.messages.get(id).map(|m| m.delivery_state)
    }

    pub fn roster_names(&self) -> Vec<String> {
        self.roster.names_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::events::NoticeLevel;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RenderLog {
        rendered: Vec<(MessageId, String, String)>,
        failed: Vec<MessageId>,
        notices: Vec<(NoticeLevel, String)>,
        rosters: Vec<Vec<String>>,
        connections: Vec<ConnectionState>,
        sounds: usize,
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer(Arc<Mutex<RenderLog>>);

    impl Renderer for RecordingRenderer {
        fn render(&mut self, message: &ChatMessage) {
            self.0.lock().unwrap().rendered.push((
                message.id.clone(),
                message.author.clone(),
                message.text.clone(),
            ));
        }
        fn mark_failed(&mut self, id: &MessageId) {
            self.0.lock().unwrap().failed.push(id.clone());
        }
        fn notify(&mut self, notice: Notice) {
            self.0.lock().unwrap().notices.push((notice.level, notice.text));
        }
        fn roster_changed(&mut self, names: &[String]) {
            self.0.lock().unwrap().rosters.push(names.to_vec());
        }
        fn connection_changed(&mut self, state: ConnectionState) {
            self.0.lock().unwrap().connections.push(state);
        }
        fn sound_cue(&mut self) {
            self.0.lock().unwrap().sounds += 1;
        }
    }

    struct Harness {
        engine: SyncEngine,
        events_rx: mpsc::UnboundedReceiver<EngineInput>,
        outbound_rx: mpsc::UnboundedReceiver<SendRequest>,
        push_rx: mpsc::UnboundedReceiver<PushCommand>,
        log: Arc<Mutex<RenderLog>>,
    }

    fn harness() -> Harness {
        let config = ClientConfig {
            username: "me".to_string(),
            ..ClientConfig::default()
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Disconnected);
        let log = Arc::new(Mutex::new(RenderLog::default()));
        let renderer = RecordingRenderer(log.clone());
        let engine = SyncEngine::new(
            &config,
            Box::new(renderer),
            events_tx,
            outbound_tx,
            push_tx,
            state_tx,
        );
        Harness { engine, events_rx, outbound_rx, push_rx, log }
    }

    fn echo(author: &str, text: &str) -> RemoteEvent {
        RemoteEvent::NewMessage {
            author: author.to_string(),
            text: text.to_string(),
            sent_at: 1_700_000_000,
        }
    }

    fn error_notices(log: &Arc<Mutex<RenderLog>>) -> usize {
        log.lock()
            .unwrap()
            .notices
            .iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .count()
    }

    #[tokio::test]
    async fn optimistic_send_renders_once_and_echo_confirms() {
        let mut h = harness();
        let id = h.engine.send_local("hi").unwrap();
        assert_eq!(h.log.lock().unwrap().rendered.len(), 1);
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Pending));

        h.engine.on_remote_event(echo("me", "hi"));
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Confirmed));
        // the echo must not produce a second rendering of the same id
        let log = h.log.lock().unwrap();
        assert_eq!(log.rendered.len(), 1);
        assert_eq!(log.rendered[0].0, id);
        assert!(log.failed.is_empty());
    }

    #[tokio::test]
    async fn repeated_echoes_never_touch_a_confirmed_id() {
        let mut h = harness();
        let id = h.engine.send_local("hi").unwrap();
        h.engine.on_remote_event(echo("me", "hi"));
        // a second identical echo has no pending entry left: it renders as a
        // fresh remote message, under a different id
        h.engine.on_remote_event(echo("me", "hi"));
        let log = h.log.lock().unwrap();
        assert_eq!(log.rendered.len(), 2);
        assert_ne!(log.rendered[1].0, id);
        let per_id = log.rendered.iter().filter(|(rid, _, _)| *rid == id).count();
        assert_eq!(per_id, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn echo_before_timeout_invalidates_the_timer() {
        let mut h = harness();
        let id = h.engine.send_local("hi").unwrap();
        h.engine.on_remote_event(echo("me", "hi"));

        tokio::time::sleep(Duration::from_secs(11)).await;
        // the timeout timer was cancelled on confirmation: nothing arrives
        assert!(h.events_rx.try_recv().is_err());
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Confirmed));
        assert!(h.log.lock().unwrap().failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_exactly_once() {
        let mut h = harness();
        let id = h.engine.send_local("hi").unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        let input = h.events_rx.try_recv().expect("timeout should have fired");
        h.engine.handle_input(input);
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Failed));
        assert_eq!(h.log.lock().unwrap().failed, vec![id.clone()]);
        assert_eq!(error_notices(&h.log), 1);

        // a stale duplicate expiry changes nothing
        h.engine.handle_input(EngineInput::PendingExpired { id: id.clone() });
        assert_eq!(h.log.lock().unwrap().failed.len(), 1);
        assert_eq!(error_notices(&h.log), 1);
    }

    #[tokio::test]
    async fn transport_error_fails_and_message_is_never_resurrected() {
        let mut h = harness();
        let id = h.engine.send_local("hi").unwrap();
        h.engine.handle_input(EngineInput::SendResult {
            id: id.clone(),
            result: Err(SendError::Network("connection refused".to_string())),
        });
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Failed));
        assert_eq!(error_notices(&h.log), 1);

        // late timer for the same message: ignored
        h.engine.handle_input(EngineInput::PendingExpired { id: id.clone() });
        assert_eq!(error_notices(&h.log), 1);

        // a late echo no longer matches a pending entry, so the failed
        // message stays failed; the echo renders as a separate remote message
        h.engine.on_remote_event(echo("me", "hi"));
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Failed));
        assert_eq!(h.log.lock().unwrap().rendered.len(), 2);
    }

    #[tokio::test]
    async fn identical_texts_confirm_in_insertion_order() {
        let mut h = harness();
        let first = h.engine.send_local("ok").unwrap();
        let second = h.engine.send_local("ok").unwrap();

        h.engine.on_remote_event(echo("me", "ok"));
        assert_eq!(h.engine.delivery_state(&first), Some(DeliveryState::Confirmed));
        assert_eq!(h.engine.delivery_state(&second), Some(DeliveryState::Pending));

        h.engine.on_remote_event(echo("me", "ok"));
        assert_eq!(h.engine.delivery_state(&second), Some(DeliveryState::Confirmed));
        // still only the two optimistic renderings
        assert_eq!(h.log.lock().unwrap().rendered.len(), 2);
    }

    #[tokio::test]
    async fn remote_messages_render_with_sound_cue() {
        let mut h = harness();
        h.engine.on_remote_event(echo("alice", "ciao"));
        let log = h.log.lock().unwrap();
        assert_eq!(log.rendered.len(), 1);
        assert_eq!(log.rendered[0].1, "alice");
        assert_eq!(log.sounds, 1);
    }

    #[tokio::test]
    async fn send_rejects_empty_and_overlong_input() {
        let mut h = harness();
        assert!(h.engine.send_local("   ").is_none());
        let long = "x".repeat(3000);
        assert!(h.engine.send_local(&long).is_none());
        let log = h.log.lock().unwrap();
        assert!(log.rendered.is_empty());
        assert_eq!(log.notices.len(), 1);
        assert!(h.outbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn roster_excludes_local_user_and_duplicates() {
        let mut h = harness();
        h.engine.on_remote_event(RemoteEvent::UserJoined { name: "me".to_string() });
        assert!(h.engine.roster_names().is_empty());

        h.engine.on_remote_event(RemoteEvent::UserJoined { name: "Alex".to_string() });
        h.engine.on_remote_event(RemoteEvent::UserJoined { name: "Alex".to_string() });
        assert_eq!(h.engine.roster_names(), vec!["Alex"]);

        h.engine.on_remote_event(RemoteEvent::RosterSnapshot {
            names: vec!["Alex".to_string(), "Sam".to_string(), "me".to_string()],
        });
        assert_eq!(h.engine.roster_names(), vec!["Alex", "Sam"]);

        h.engine.on_remote_event(RemoteEvent::UserLeft { name: "Alex".to_string() });
        assert_eq!(h.engine.roster_names(), vec!["Sam"]);
    }

    #[tokio::test]
    async fn join_then_snapshot_leaves_no_stale_entries() {
        let mut h = harness();
        h.engine.on_remote_event(RemoteEvent::UserJoined { name: "Alex".to_string() });
        h.engine.on_remote_event(RemoteEvent::RosterSnapshot {
            names: vec!["Alex".to_string(), "Sam".to_string()],
        });
        assert_eq!(h.engine.roster_names(), vec!["Alex", "Sam"]);
    }

    #[tokio::test]
    async fn system_message_is_notification_only() {
        let mut h = harness();
        h.engine.on_remote_event(RemoteEvent::SystemMessage {
            text: "maintenance at noon".to_string(),
        });
        let log = h.log.lock().unwrap();
        assert!(log.rendered.is_empty());
        assert!(log.rosters.is_empty());
        assert_eq!(log.notices.len(), 1);
    }

    #[tokio::test]
    async fn send_while_disconnected_still_posts_and_poll_echo_deduplicates() {
        let mut h = harness();
        assert_eq!(h.engine.connection(), ConnectionState::Disconnected);
        let id = h.engine.send_local("hi").unwrap();

        // the shared outbound request was queued even without a push channel
        let request = h.outbound_rx.try_recv().unwrap();
        assert_eq!(request.text, "hi");
        assert_eq!(request.username, "me");

        // poll-derived echo confirms without a duplicate render
        h.engine.on_remote_event(echo("me", "hi"));
        assert_eq!(h.engine.delivery_state(&id), Some(DeliveryState::Confirmed));
        assert_eq!(h.log.lock().unwrap().rendered.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_exhaustion_notifies_exactly_once() {
        let mut h = harness();
        h.engine.start();
        assert_eq!(h.push_rx.try_recv().ok(), Some(PushCommand::Connect));

        for _ in 0..5 {
            h.engine.handle_input(EngineInput::ChannelClosed {
                by_server: false,
                reason: "connect failed".to_string(),
            });
            h.engine.handle_input(EngineInput::ReconnectDue);
            assert_eq!(h.engine.connection(), ConnectionState::Connecting);
            assert_eq!(h.push_rx.try_recv().ok(), Some(PushCommand::Connect));
        }

        // sixth loss: attempts are exhausted, exactly one fatal notice
        h.engine.handle_input(EngineInput::ChannelClosed {
            by_server: false,
            reason: "connect failed".to_string(),
        });
        assert_eq!(h.engine.connection(), ConnectionState::Disconnected);
        assert_eq!(error_notices(&h.log), 1);

        // further reconnect prompts stay ignored
        h.engine.handle_input(EngineInput::ReconnectDue);
        assert_eq!(h.engine.connection(), ConnectionState::Disconnected);
        assert!(h.push_rx.try_recv().is_err());
        assert_eq!(error_notices(&h.log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_initiated_close_never_reconnects() {
        let mut h = harness();
        h.engine.start();
        let _ = h.push_rx.try_recv();
        h.engine.handle_input(EngineInput::ChannelOpened);
        assert_eq!(h.engine.connection(), ConnectionState::Connected);

        h.engine.handle_input(EngineInput::ChannelClosed {
            by_server: true,
            reason: "server shutdown".to_string(),
        });
        assert_eq!(h.engine.connection(), ConnectionState::Disconnected);

        // no backoff timer was scheduled
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(h.events_rx.try_recv().is_err());
        assert!(h.push_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_open_resets_the_attempt_counter() {
        let mut h = harness();
        h.engine.start();
        let _ = h.push_rx.try_recv();
        h.engine.handle_input(EngineInput::ChannelClosed {
            by_server: false,
            reason: "drop".to_string(),
        });
        h.engine.handle_input(EngineInput::ChannelClosed {
            by_server: false,
            reason: "drop".to_string(),
        });
        assert_eq!(h.engine.reconnect_attempts(), 1);

        h.engine.handle_input(EngineInput::ReconnectDue);
        h.engine.handle_input(EngineInput::ChannelOpened);
        assert_eq!(h.engine.reconnect_attempts(), 0);
        assert_eq!(h.engine.connection(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn reconnect_due_is_ignored_while_connected() {
        let mut h = harness();
        h.engine.start();
        let _ = h.push_rx.try_recv();
        h.engine.handle_input(EngineInput::ChannelOpened);

        // stale backoff timer firing after a successful reconnect
        h.engine.handle_input(EngineInput::ReconnectDue);
        assert_eq!(h.engine.connection(), ConnectionState::Connected);
        assert!(h.push_rx.try_recv().is_err());
    }
}
