use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::client::config::ClientConfig;
use crate::client::models::events::ConnectionState;
use crate::client::services::http_api::HttpApi;
use crate::client::services::poll_channel::PollChannel;
use crate::client::services::push_channel::PushChannel;
use crate::client::services::sync_engine::{EngineInput, SendRequest, SyncEngine};
use crate::client::ui::Renderer;

/// One chat session: owns the engine task, both transports and the HTTP
/// send worker, constructed once at startup and torn down explicitly (or on
/// drop). Everything the session spawns is aborted at teardown, including
/// the otherwise endless poll loop.
pub struct ChatSession {
    inputs_tx: mpsc::UnboundedSender<EngineInput>,
    engine_task: JoinHandle<()>,
    send_worker: JoinHandle<()>,
    push_task: JoinHandle<()>,
    poll_task: JoinHandle<()>,
}

impl ChatSession {
    pub fn start(config: &ClientConfig, renderer: Box<dyn Renderer>) -> anyhow::Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel::<EngineInput>();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SendRequest>();
        let (push_cmd_tx, push_cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let http = HttpApi::new(&config.http_base);

        let push = PushChannel::new(&config.websocket_url(), &config.username, events_tx.clone())?;
        let push_task = push.spawn(push_cmd_rx);

        let poll = PollChannel::new(http.clone(), events_tx.clone(), state_rx);
        let poll_task = poll.spawn();

        // Send worker: drains the outbound queue one request at a time and
        // reports each outcome back to the engine.
        let send_worker = {
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                while let Some(request) = outbound_rx.recv().await {
                    let result = http.send_message(&request.username, &request.text).await;
                    let outcome = EngineInput::SendResult { id: request.id, result };
                    if events_tx.send(outcome).is_err() {
                        break;
                    }
                }
                log::debug!("[SESSION] send worker stopped");
            })
        };

        let mut engine = SyncEngine::new(
            config,
            renderer,
            events_tx.clone(),
            outbound_tx,
            push_cmd_tx,
            state_tx,
        );
        engine.start();
        let engine_task = tokio::spawn(engine.run(events_rx));

        log::info!("[SESSION] started for user {}", config.username);
        Ok(Self {
            inputs_tx: events_tx,
            engine_task,
            send_worker,
            push_task,
            poll_task,
        })
    }

    /// Queue a user message for optimistic send.
    pub fn send(&self, text: &str) -> anyhow::Result<()> {
        self.inputs_tx
            .send(EngineInput::SendText(text.to_string()))
            .map_err(|_| anyhow::anyhow!("session already stopped"))
    }

    /// Ask the engine to re-emit the current roster to the renderer.
    pub fn show_roster(&self) -> anyhow::Result<()> {
        self.inputs_tx
            .send(EngineInput::ShowRoster)
            .map_err(|_| anyhow::anyhow!("session already stopped"))
    }

    pub fn shutdown(&self) {
        self.engine_task.abort();
        self.send_worker.abort();
        self.push_task.abort();
        self.poll_task.abort();
        log::info!("[SESSION] stopped");
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::events::Notice;
    use crate::client::models::message::{ChatMessage, MessageId};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingRenderer {
        rendered: Arc<Mutex<Vec<String>>>,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, message: &ChatMessage) {
            self.rendered.lock().unwrap().push(message.text.clone());
        }
        fn mark_failed(&mut self, _id: &MessageId) {}
        fn notify(&mut self, _notice: Notice) {}
        fn roster_changed(&mut self, _names: &[String]) {}
        fn connection_changed(&mut self, _state: ConnectionState) {}
        fn sound_cue(&mut self) {}
    }

    #[tokio::test]
    async fn send_renders_optimistically_even_with_no_server() {
        let config = ClientConfig {
            // nothing listens here; the send will fail, the render must not
            http_base: "http://127.0.0.1:9".to_string(),
            websocket_host: "127.0.0.1".to_string(),
            websocket_port: 9,
            username: "me".to_string(),
            ..ClientConfig::default()
        };
        let renderer = CountingRenderer::default();
        let rendered = renderer.rendered.clone();

        let session = ChatSession::start(&config, Box::new(renderer)).unwrap();
        session.send("hello out there").unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        assert_eq!(rendered.lock().unwrap().as_slice(), ["hello out there".to_string()]);
        session.shutdown();
    }
}
