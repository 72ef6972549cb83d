use ratatui::style::Style;
use tui_textarea::TextArea;

use crate::api::CompletionClient;
use crate::core::config::Config;
use crate::core::session::ConversationSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Compose,
    PromptEditor,
}

pub struct UiState {
    pub input: TextArea<'static>,
    pub prompt_editor: TextArea<'static>,
    pub mode: AppMode,
    pub status: Option<String>,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub exit_requested: bool,
}

impl UiState {
    fn new() -> Self {
        Self {
            input: compose_textarea(),
            prompt_editor: TextArea::default(),
            mode: AppMode::Compose,
            status: None,
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
        }
    }
}

fn compose_textarea() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text("Type your message here...");
    textarea.set_cursor_line_style(Style::default());
    textarea
}

fn editor_textarea(seed: &str) -> TextArea<'static> {
    let mut textarea = TextArea::from(seed.lines());
    textarea.set_cursor_line_style(Style::default());
    textarea
}

/// Per-process application object wiring the session, the completion
/// client, and the terminal UI state together. Constructed once and passed
/// into the chat loop by value.
pub struct App {
    pub session: ConversationSession,
    pub client: CompletionClient,
    pub config: Config,
    pub ui: UiState,
}

impl App {
    pub fn new(config: Config) -> Self {
        let session = ConversationSession::new(config.session_config());
        let client = CompletionClient::new(config.endpoint.clone());
        Self {
            session,
            client,
            config,
            ui: UiState::new(),
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.ui.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.ui.status = None;
    }

    /// Returns the composed text and clears the input surface.
    pub fn take_input(&mut self) -> String {
        let text = self.ui.input.lines().join("\n");
        self.ui.input = compose_textarea();
        text
    }

    /// Opens the prompt editor seeded from the staged draft.
    pub fn open_prompt_editor(&mut self) {
        self.ui.prompt_editor = editor_textarea(self.session.system_prompt_draft());
        self.ui.mode = AppMode::PromptEditor;
    }

    /// Saves the editor contents as the committed system prompt.
    pub fn commit_prompt_editor(&mut self) {
        let text = self.ui.prompt_editor.lines().join("\n");
        self.session.set_system_prompt_draft(text);
        self.session.commit_system_prompt();
        self.ui.mode = AppMode::Compose;
        self.set_status("System prompt updated.");
    }

    /// Closes the editor without committing; the draft resets to the
    /// committed prompt so a later open starts clean.
    pub fn cancel_prompt_editor(&mut self) {
        self.session.discard_system_prompt_draft();
        self.ui.mode = AppMode::Compose;
    }
}
