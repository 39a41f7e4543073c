use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::client::models::events::ConnectionState;
use crate::client::services::http_api::HttpApi;
use crate::client::services::line_parser;
use crate::client::services::sync_engine::EngineInput;

/// Poll cadence while the push channel is down and polling carries the chat.
const PRIMARY_INTERVAL: Duration = Duration::from_secs(2);
/// Cadence while a push reconnect is in flight and polling covers the gap.
const ARMED_INTERVAL: Duration = Duration::from_secs(5);
/// Parked cadence alongside a healthy push channel, to notice one that
/// silently died.
const PARKED_INTERVAL: Duration = Duration::from_secs(30);

/// Poll variant of the transport: fetches the latest formatted line from
/// `GET /poll` and forwards it as an event when it changed since the last
/// look. Poll failures are logged and swallowed — the loop is best-effort
/// and retries on its own next tick.
pub struct PollChannel {
    http: HttpApi,
    events_tx: mpsc::UnboundedSender<EngineInput>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl PollChannel {
    pub fn new(
        http: HttpApi,
        events_tx: mpsc::UnboundedSender<EngineInput>,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { http, events_tx, state_rx }
    }

    /// Spawn the self-rescheduling poll loop. It has no stop condition of
    /// its own; the session owns the handle and aborts it on teardown.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last_seen = String::new();
            loop {
                let interval = match *self.state_rx.borrow() {
                    ConnectionState::Disconnected => PRIMARY_INTERVAL,
                    ConnectionState::Connecting => ARMED_INTERVAL,
                    ConnectionState::Connected => PARKED_INTERVAL,
                };
                tokio::time::sleep(interval).await;

                match self.http.poll_latest().await {
                    Ok(Some(text)) => {
                        if text == last_seen {
                            continue; // unchanged since the last look
                        }
                        last_seen = text.clone();
                        match line_parser::parse_poll_line(&text) {
                            Some(event) => {
                                if self.events_tx.send(EngineInput::Remote(event)).is_err() {
                                    break; // engine gone
                                }
                            }
                            None => log::debug!("[POLL] unparseable line: {}", text),
                        }
                    }
                    Ok(None) => {} // niente di nuovo
                    Err(e) => {
                        // best-effort: no notification spam for poll failures
                        log::debug!("[POLL] poll failed: {}", e);
                    }
                }
            }
            log::debug!("[POLL] loop stopped");
        })
    }
}
