use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::constants::{ERROR_NO_CONTENT, ERROR_UNREACHABLE};
use crate::utils::url::construct_api_url;

/// Internal classification of a failed completion exchange.
///
/// These never cross the session boundary; callers of [`CompletionClient::send`]
/// only ever see the two sentinel strings. The variants exist so diagnostics
/// can name the actual cause.
#[derive(Debug)]
pub enum ClientError {
    /// Network-level failure, including connect errors and the request timeout.
    Transport(reqwest::Error),

    /// The backend answered with a non-success status code.
    BadStatus(u16),

    /// The backend answered 200 with a body that is not a completions payload.
    MalformedBody(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(source) if source.is_timeout() => {
                write!(f, "request timed out: {source}")
            }
            ClientError::Transport(source) => write!(f, "transport failure: {source}"),
            ClientError::BadStatus(code) => write!(f, "unexpected HTTP status {code}"),
            ClientError::MalformedBody(source) => {
                write!(f, "malformed completion body: {source}")
            }
        }
    }
}

impl StdError for ClientError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ClientError::Transport(source) => Some(source),
            ClientError::BadStatus(_) => None,
            ClientError::MalformedBody(source) => Some(source),
        }
    }
}

/// Performs the single HTTP exchange with the completion backend.
///
/// Stateless apart from the shared connection pool and the endpoint base URL.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
}

impl CompletionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Sends the assembled message list and returns the reply text.
    ///
    /// Failures collapse to fixed sentinel strings rather than errors: the
    /// conversation surfaces them as if they were an assistant reply. The
    /// underlying cause is logged before it is discarded.
    pub async fn send(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        timeout: Duration,
    ) -> String {
        match self.try_send(messages, temperature, timeout).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "completion request failed");
                ERROR_UNREACHABLE.to_string()
            }
        }
    }

    async fn try_send(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        let url = construct_api_url(&self.base_url, "chat/completions");
        let request = ChatRequest {
            messages: messages.to_vec(),
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::BadStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(ClientError::Transport)?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(ClientError::MalformedBody)?;

        // A 200 without usable content is still a successful return; the
        // placeholder reads as an assistant reply.
        Ok(parsed
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_else(|| ERROR_NO_CONTENT.to_string()))
    }
}
