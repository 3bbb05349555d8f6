use async_trait::async_trait;
use oasis_shared::RequesterId;
use serde::Serialize;

/// One button of an inline keyboard; `data` comes back verbatim as a
/// callback when the button is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// Keyboard attached to an outbound message. `Menu` replaces the
/// requester's persistent keyboard; its labels arrive back as plain
/// message text. `Inline` renders buttons under the message itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    Menu { rows: Vec<Vec<String>> },
    Inline { rows: Vec<Vec<Button>> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub recipient: RequesterId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat relay answered {0}")]
    Status(reqwest::StatusCode),
}

/// Delivery seam to the chat service. Best effort only: callers log
/// failures and move on, nothing is retried.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn deliver(&self, message: OutboundMessage) -> Result<(), TransportError>;
}

/// Production transport: POSTs each message as JSON to the configured
/// relay endpoint with a bearer token.
pub struct HttpChatTransport {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl HttpChatTransport {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_token,
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn deliver(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }
        Ok(())
    }
}
