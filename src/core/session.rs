use std::error::Error as StdError;
use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::api::{ChatMessage, CompletionClient};
use crate::core::constants::{
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, REQUEST_TIMEOUT, RESPONSE_STOPPED,
};
use crate::core::message::{Message, Role};

/// User-adjustable request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub system_prompt: String,
    temperature: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl SessionConfig {
    pub fn new(system_prompt: impl Into<String>, temperature: f64) -> Self {
        let mut config = Self {
            system_prompt: system_prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
        };
        config.set_temperature(temperature);
        config
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Clamps to the valid sampling range. Non-finite input is ignored.
    pub fn set_temperature(&mut self, value: f64) {
        if value.is_finite() {
            self.temperature = value.clamp(0.0, 1.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    AwaitingResponse,
}

/// Failure to replace the transcript from an uploaded artifact.
#[derive(Debug)]
pub enum ImportError {
    /// Input is not a JSON array of `{role, content}` messages.
    MalformedJson(serde_json::Error),

    /// The array contains a system-role entry; the system prompt lives
    /// outside the transcript.
    SystemRoleEntry,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::MalformedJson(source) => write!(f, "invalid JSON format: {source}"),
            ImportError::SystemRoleEntry => {
                write!(f, "history may not contain system-role messages")
            }
        }
    }
}

impl StdError for ImportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ImportError::MalformedJson(source) => Some(source),
            ImportError::SystemRoleEntry => None,
        }
    }
}

/// Everything a spawned exchange task needs for one request.
///
/// Holding the assembled messages by value keeps the session free for UI
/// work while the call is in flight.
pub struct RequestHandle {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    cancel: CancellationToken,
}

impl RequestHandle {
    /// Settle-time cancellation substitution: if the user stopped the
    /// request while it was in flight, the backend's answer is discarded.
    pub fn settle(self, reply: String) -> String {
        resolve_reply(&self.cancel, reply)
    }
}

fn resolve_reply(cancel: &CancellationToken, reply: String) -> String {
    if cancel.is_cancelled() {
        RESPONSE_STOPPED.to_string()
    } else {
        reply
    }
}

/// The conversation state machine.
///
/// Owns the transcript, the session config, the awaiting-response gate,
/// and the cancellation token for the in-flight request. Constructed once
/// per process and handed to the UI layer by value; there is no global
/// registry.
pub struct ConversationSession {
    transcript: Vec<Message>,
    config: SessionConfig,
    request_state: RequestState,
    cancel_token: CancellationToken,
    prompt_draft: String,
    history_loaded: bool,
}

impl ConversationSession {
    pub fn new(config: SessionConfig) -> Self {
        let prompt_draft = config.system_prompt.clone();
        Self {
            transcript: Vec::new(),
            config,
            request_state: RequestState::Idle,
            cancel_token: CancellationToken::new(),
            prompt_draft,
            history_loaded: false,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_awaiting(&self) -> bool {
        self.request_state == RequestState::AwaitingResponse
    }

    pub fn history_loaded(&self) -> bool {
        self.history_loaded
    }

    pub fn set_temperature(&mut self, value: f64) {
        self.config.set_temperature(value);
    }

    /// Appends a user turn.
    ///
    /// Precondition: no request in flight and non-empty text. The UI keeps
    /// the input surface rejecting submission while awaiting, so the guard
    /// here only covers misuse; violating calls are ignored.
    pub fn append_user(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.is_awaiting() || text.trim().is_empty() {
            return;
        }
        self.transcript.push(Message::user(text));
    }

    /// Appends the assistant turn and re-enables input.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::assistant(text));
        self.request_state = RequestState::Idle;
    }

    /// Closes the input surface and installs a fresh cancellation token.
    ///
    /// The returned handle carries everything the exchange needs; at most
    /// one handle is outstanding at a time, enforced by the request-state
    /// gate at the submission surface.
    pub fn begin_request(&mut self) -> RequestHandle {
        self.request_state = RequestState::AwaitingResponse;
        self.cancel_token = CancellationToken::new();
        RequestHandle {
            messages: self.request_messages(),
            temperature: self.config.temperature,
            cancel: self.cancel_token.clone(),
        }
    }

    /// Flags the in-flight request as stopped.
    ///
    /// Advisory only: the HTTP call is not aborted. The flag is observed
    /// when the call settles, at which point the cancellation message is
    /// substituted for the backend's answer. Does not change the request
    /// state; input stays closed until the exchange settles.
    pub fn cancel_request(&self) {
        self.cancel_token.cancel();
    }

    /// Performs the exchange for the current request in place.
    ///
    /// `begin_request` must have been called first; the UI uses the
    /// handle-based path instead so the event loop stays responsive.
    pub async fn request_completion(&self, client: &CompletionClient) -> String {
        let reply = client
            .send(
                &self.request_messages(),
                self.config.temperature,
                REQUEST_TIMEOUT,
            )
            .await;
        resolve_reply(&self.cancel_token, reply)
    }

    /// Ordered wire messages: the system prompt, then the full transcript
    /// including the just-appended user turn.
    pub fn request_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(ChatMessage {
            role: Role::System.as_str().to_string(),
            content: self.config.system_prompt.clone(),
        });
        messages.extend(self.transcript.iter().map(|message| ChatMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }));
        messages
    }

    pub fn system_prompt_draft(&self) -> &str {
        &self.prompt_draft
    }

    pub fn set_system_prompt_draft(&mut self, text: impl Into<String>) {
        self.prompt_draft = text.into();
    }

    /// Copies the draft into the committed prompt.
    pub fn commit_system_prompt(&mut self) {
        self.config.system_prompt = self.prompt_draft.clone();
    }

    /// Resets the draft to the committed prompt, discarding edits.
    pub fn discard_system_prompt_draft(&mut self) {
        self.prompt_draft = self.config.system_prompt.clone();
    }

    /// Prompt import: trims and installs both the committed prompt and
    /// the draft, so an open editor picks up the loaded text.
    pub fn load_system_prompt(&mut self, text: &str) {
        let trimmed = text.trim();
        self.config.system_prompt = trimmed.to_string();
        self.prompt_draft = trimmed.to_string();
    }

    /// Replaces the transcript from a JSON array of messages.
    ///
    /// On any failure the prior transcript is left untouched. Success sets
    /// the history-loaded guard so an import surface that re-presents the
    /// same artifact can skip re-applying it.
    pub fn import_transcript(&mut self, raw: &str) -> Result<(), ImportError> {
        let messages: Vec<Message> =
            serde_json::from_str(raw).map_err(ImportError::MalformedJson)?;
        if messages.iter().any(|message| message.role == Role::System) {
            return Err(ImportError::SystemRoleEntry);
        }
        self.transcript = messages;
        self.history_loaded = true;
        Ok(())
    }

    /// Plain-text rendering: `"<Role>: <content>"` per message, blank-line
    /// separated, in transcript order.
    pub fn export_transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|message| format!("{}: {}", message.role.capitalized(), message.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// JSON array-of-message rendering for round-tripping with
    /// [`Self::import_transcript`].
    pub fn export_transcript_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.transcript)
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{ERROR_NO_CONTENT, RESPONSE_STOPPED};

    #[test]
    fn append_user_grows_transcript_in_order() {
        let mut session = ConversationSession::default();
        session.append_user("one");
        session.append_user("two");

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "one");
        assert_eq!(transcript[1].content, "two");
        assert!(transcript.iter().all(|m| m.role.is_user()));
    }

    #[test]
    fn append_user_ignores_empty_and_in_flight_input() {
        let mut session = ConversationSession::default();
        session.append_user("   ");
        assert!(session.transcript().is_empty());

        session.append_user("hello");
        let _handle = session.begin_request();
        session.append_user("too eager");
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn append_assistant_reopens_input() {
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let _handle = session.begin_request();
        assert!(session.is_awaiting());

        session.append_assistant("hello");
        assert_eq!(session.request_state(), RequestState::Idle);
        assert!(session.transcript()[1].role.is_assistant());
    }

    #[test]
    fn request_messages_prepend_system_prompt() {
        let mut session =
            ConversationSession::new(SessionConfig::new("Answer in rhyme.", 0.3));
        session.append_user("hi");

        let messages = session.request_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "Answer in rhyme.");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "hi");
    }

    #[test]
    fn settle_substitutes_after_cancellation() {
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let handle = session.begin_request();
        session.cancel_request();

        assert_eq!(handle.settle("real answer".to_string()), RESPONSE_STOPPED);
        // State stays awaiting until the reply is appended.
        assert!(session.is_awaiting());
    }

    #[test]
    fn settle_passes_reply_through_without_cancellation() {
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let handle = session.begin_request();

        assert_eq!(handle.settle("real answer".to_string()), "real answer");
    }

    #[test]
    fn begin_request_resets_the_cancel_flag() {
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let first = session.begin_request();
        session.cancel_request();
        session.append_assistant("stopped");

        let second = session.begin_request();
        assert_eq!(first.settle("a".to_string()), RESPONSE_STOPPED);
        assert_eq!(second.settle("b".to_string()), "b");
    }

    #[test]
    fn staged_prompt_commit_and_discard() {
        let mut session = ConversationSession::default();
        let committed = session.config().system_prompt.clone();

        session.set_system_prompt_draft("X");
        session.discard_system_prompt_draft();
        assert_eq!(session.config().system_prompt, committed);
        assert_eq!(session.system_prompt_draft(), committed);

        session.set_system_prompt_draft("X");
        session.commit_system_prompt();
        assert_eq!(session.config().system_prompt, "X");
    }

    #[test]
    fn load_system_prompt_trims_and_updates_draft() {
        let mut session = ConversationSession::default();
        session.set_system_prompt_draft("stale edit");
        session.load_system_prompt("  Be terse.\n");

        assert_eq!(session.config().system_prompt, "Be terse.");
        assert_eq!(session.system_prompt_draft(), "Be terse.");
    }

    #[test]
    fn temperature_is_clamped_to_unit_range() {
        let mut session = ConversationSession::default();
        session.set_temperature(1.7);
        assert_eq!(session.config().temperature(), 1.0);

        session.set_temperature(-0.3);
        assert_eq!(session.config().temperature(), 0.0);

        session.set_temperature(f64::NAN);
        assert_eq!(session.config().temperature(), 0.0);

        session.set_temperature(0.35);
        assert_eq!(session.config().temperature(), 0.35);
    }

    #[test]
    fn export_text_uses_capitalized_prefixes_and_blank_lines() {
        let mut session = ConversationSession::default();
        session.append_user("Hi");
        session.append_assistant("Hello");

        assert_eq!(session.export_transcript_text(), "User: Hi\n\nAssistant: Hello");
    }

    #[test]
    fn import_replaces_transcript_and_sets_guard() {
        let mut session = ConversationSession::default();
        session.append_user("old");

        session
            .import_transcript(r#"[{"role":"user","content":"x"}]"#)
            .unwrap();

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].content, "x");
        assert!(session.transcript()[0].role.is_user());
        assert!(session.history_loaded());
    }

    #[test]
    fn import_rejects_malformed_json_without_touching_state() {
        let mut session = ConversationSession::default();
        session.append_user("keep me");

        let err = session.import_transcript("not json").unwrap_err();
        assert!(matches!(err, ImportError::MalformedJson(_)));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].content, "keep me");
        assert!(!session.history_loaded());
    }

    #[test]
    fn import_rejects_system_role_entries() {
        let mut session = ConversationSession::default();
        session.append_user("keep me");

        let raw = r#"[{"role":"system","content":"sneaky"},{"role":"user","content":"x"}]"#;
        let err = session.import_transcript(raw).unwrap_err();
        assert!(matches!(err, ImportError::SystemRoleEntry));
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn transcript_round_trips_through_json_export() {
        let mut session = ConversationSession::default();
        session.append_user("Hi");
        session.append_assistant("Hello");

        let json = session.export_transcript_json().unwrap();
        let mut restored = ConversationSession::default();
        restored.import_transcript(&json).unwrap();

        assert_eq!(restored.transcript(), session.transcript());
    }

    #[tokio::test]
    async fn request_completion_substitutes_when_cancelled_before_settle() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"choices":[{"message":{"content":"late answer"}}]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let client = CompletionClient::new(format!("http://{addr}/v1"));
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let _handle = session.begin_request();
        session.cancel_request();

        let reply = session.request_completion(&client).await;
        assert_eq!(reply, RESPONSE_STOPPED);
    }

    #[tokio::test]
    async fn request_completion_surfaces_backend_sentinels() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"choices":[]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let client = CompletionClient::new(format!("http://{addr}/v1"));
        let mut session = ConversationSession::default();
        session.append_user("hi");
        let _handle = session.begin_request();

        let reply = session.request_completion(&client).await;
        assert_eq!(reply, ERROR_NO_CONTENT);
    }
}
