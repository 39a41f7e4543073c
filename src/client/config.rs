use std::env;
use tokio::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the HTTP bridge (`/send` and `/poll` live under it).
    pub http_base: String,
    pub websocket_host: String,
    pub websocket_port: u16,
    pub username: String,
    pub log_level: String,
    pub pending_timeout: Duration,
    pub reconnect_base_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub max_message_length: usize,
    pub sound_enabled: bool,
    pub show_timestamps: bool,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            http_base: env::var("CHAT_HTTP_BASE").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            websocket_host: env::var("WEBSOCKET_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            websocket_port: env::var("WEBSOCKET_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8081),
            username: env::var("CHAT_USERNAME").unwrap_or_else(|_| "Anonymous".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            pending_timeout: Duration::from_secs(
                env::var("PENDING_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            ),
            reconnect_base_delay: Duration::from_secs(
                env::var("RECONNECT_BASE_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(2),
            ),
            max_reconnect_attempts: env::var("MAX_RECONNECT_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            max_message_length: env::var("MAX_MESSAGE_LENGTH").ok().and_then(|v| v.parse().ok()).unwrap_or(2048),
            sound_enabled: env::var("CHAT_SOUND").map(|v| v == "true" || v == "1").unwrap_or(true),
            show_timestamps: env::var("CHAT_TIMESTAMPS").map(|v| v == "true" || v == "1").unwrap_or(true),
        }
    }

    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}", self.websocket_host, self.websocket_port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_base: "http://127.0.0.1:8080".to_string(),
            websocket_host: "127.0.0.1".to_string(),
            websocket_port: 8081,
            username: "Anonymous".to_string(),
            log_level: "info".to_string(),
            pending_timeout: Duration::from_secs(10),
            reconnect_base_delay: Duration::from_secs(2),
            max_reconnect_attempts: 5,
            max_message_length: 2048,
            sound_enabled: true,
            show_timestamps: true,
        }
    }
}
