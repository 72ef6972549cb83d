use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};
use crate::core::app::{App, AppMode};
use crate::core::config::Config;
use crate::core::constants::REQUEST_TIMEOUT;
use crate::ui::lifecycle::{self, ChatTerminal};
use crate::ui::renderer;

/// Runs the interactive chat session until the user quits.
pub async fn run_chat(config: Config) -> Result<(), Box<dyn Error>> {
    config.ensure_directories()?;
    let app = App::new(config);

    let mut terminal = lifecycle::setup_terminal()?;
    let result = event_loop(&mut terminal, app).await;
    lifecycle::restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(terminal: &mut ChatTerminal, mut app: App) -> Result<(), Box<dyn Error>> {
    // Replies from spawned exchange tasks arrive tagged with a request id;
    // anything that does not match the current request is stale and dropped.
    let (tx, mut rx) = mpsc::unbounded_channel::<(u64, String)>();
    let mut current_request_id: u64 = 0;

    loop {
        terminal.draw(|f| renderer::draw(f, &app))?;

        let viewport = transcript_viewport(terminal);
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key, &tx, &mut current_request_id, viewport);
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => scroll_up(&mut app, 3, viewport),
                    MouseEventKind::ScrollDown => scroll_down(&mut app, 3, viewport),
                    _ => {}
                },
                _ => {}
            }
        }

        while let Ok((id, reply)) = rx.try_recv() {
            if id == current_request_id && app.session.is_awaiting() {
                app.session.append_assistant(reply);
                app.ui.auto_scroll = true;
            }
        }

        if app.ui.exit_requested {
            return Ok(());
        }
    }
}

/// Height of the transcript pane: full height minus the status line, the
/// input box, and the transcript title.
fn transcript_viewport(terminal: &ChatTerminal) -> u16 {
    terminal
        .size()
        .map(|size| size.height)
        .unwrap_or_default()
        .saturating_sub(5)
}

fn handle_key(
    app: &mut App,
    key: KeyEvent,
    tx: &mpsc::UnboundedSender<(u64, String)>,
    current_request_id: &mut u64,
    viewport: u16,
) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.ui.exit_requested = true;
        return;
    }

    match app.ui.mode {
        AppMode::PromptEditor => match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.commit_prompt_editor();
            }
            KeyCode::Esc => app.cancel_prompt_editor(),
            _ => {
                app.ui.prompt_editor.input(key);
            }
        },
        AppMode::Compose => match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                app.ui.input.insert_newline();
            }
            KeyCode::Enter => submit(app, tx, current_request_id),
            KeyCode::Esc => {
                if app.session.is_awaiting() {
                    app.session.cancel_request();
                    app.set_status("Stopping - the reply is discarded once the call settles.");
                }
            }
            KeyCode::Up => scroll_up(app, 1, viewport),
            KeyCode::Down => scroll_down(app, 1, viewport),
            KeyCode::PageUp => scroll_up(app, viewport.max(1), viewport),
            KeyCode::PageDown => scroll_down(app, viewport.max(1), viewport),
            _ => {
                app.ui.input.input(key);
            }
        },
    }
}

fn submit(app: &mut App, tx: &mpsc::UnboundedSender<(u64, String)>, current_request_id: &mut u64) {
    let text = app.ui.input.lines().join("\n");
    if text.trim().is_empty() {
        return;
    }
    app.clear_status();

    match commands::process_input(app, &text) {
        CommandResult::Continue => {
            let _ = app.take_input();
        }
        CommandResult::OpenPromptEditor => {
            let _ = app.take_input();
            app.open_prompt_editor();
        }
        CommandResult::ProcessAsMessage(message) => {
            if app.session.is_awaiting() {
                // Keep the composed text; it can be sent once the reply lands.
                app.set_status("Still waiting for the previous response.");
                return;
            }
            let _ = app.take_input();
            app.session.append_user(message);
            let handle = app.session.begin_request();

            *current_request_id += 1;
            let id = *current_request_id;
            let client = app.client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let reply = client
                    .send(&handle.messages, handle.temperature, REQUEST_TIMEOUT)
                    .await;
                let _ = tx.send((id, handle.settle(reply)));
            });
            app.ui.auto_scroll = true;
        }
    }
}

fn effective_offset(app: &App, max: u16) -> u16 {
    if app.ui.auto_scroll {
        max
    } else {
        app.ui.scroll_offset.min(max)
    }
}

fn scroll_up(app: &mut App, amount: u16, viewport: u16) {
    let max = renderer::max_scroll_offset(renderer::build_transcript_lines(app).len(), viewport);
    let current = effective_offset(app, max);
    app.ui.auto_scroll = false;
    app.ui.scroll_offset = current.saturating_sub(amount);
}

fn scroll_down(app: &mut App, amount: u16, viewport: u16) {
    let max = renderer::max_scroll_offset(renderer::build_transcript_lines(app).len(), viewport);
    let next = effective_offset(app, max).saturating_add(amount).min(max);
    app.ui.scroll_offset = next;
    if next >= max {
        app.ui.auto_scroll = true;
    }
}
