use crate::common::protocol::{PollResponse, SendErrorBody, SendMessageRequest};

/// Outcome of an outbound request against the HTTP bridge.
#[derive(Debug, Clone)]
pub enum SendError {
    /// The request could not be completed (DNS, refused, dropped, ...).
    Network(String),
    /// The server answered with a non-2xx status and (usually) an error body.
    Server(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Network(msg) => write!(f, "network error: {}", msg),
            SendError::Server(msg) => write!(f, "server error: {}", msg),
        }
    }
}

impl std::error::Error for SendError {}

/// The outbound request primitive shared by both transport variants: the
/// push and poll channels differ only in how server events reach us, every
/// send goes through the same `POST /send` call.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /send` with `{username, text}`. Any 2xx is success; a non-2xx
    /// response carries `{error}` when the server could say why.
    pub async fn send_message(&self, username: &str, text: &str) -> Result<(), SendError> {
        let body = SendMessageRequest {
            username: username.to_string(),
            text: text.to_string(),
        };
        let resp = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = match resp.json::<SendErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("unexpected status {}", status),
        };
        Err(SendError::Server(reason))
    }

    /// `GET /poll`: latest formatted line the server echoed, if any.
    pub async fn poll_latest(&self) -> Result<Option<String>, SendError> {
        let resp = self
            .client
            .get(format!("{}/poll", self.base_url))
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SendError::Server(format!("unexpected status {}", status)));
        }
        let body: PollResponse = resp
            .json()
            .await
            .map_err(|e| SendError::Server(format!("invalid poll body: {}", e)))?;
        Ok(body.text.filter(|t| !t.is_empty()))
    }
}
