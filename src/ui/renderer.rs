use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::app::{App, AppMode};

/// Builds the styled transcript lines, one blank spacer after each message.
pub fn build_transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in app.session.transcript() {
        if message.role.is_user() {
            let mut content_lines = message.content.lines();
            let first = content_lines.next().unwrap_or("").to_string();
            lines.push(Line::from(vec![
                Span::styled(
                    "You: ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(first, Style::default().fg(Color::Cyan)),
            ]));
            for rest in content_lines {
                lines.push(Line::from(Span::styled(
                    rest.to_string(),
                    Style::default().fg(Color::Cyan),
                )));
            }
        } else {
            for content_line in message.content.lines() {
                lines.push(Line::from(Span::styled(
                    content_line.to_string(),
                    Style::default().fg(Color::White),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    if app.session.is_awaiting() {
        lines.push(Line::from(Span::styled(
            "Waiting for response... (Esc to stop)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn max_scroll_offset(total_lines: usize, viewport: u16) -> u16 {
    let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
    total.saturating_sub(viewport)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let lines = build_transcript_lines(app);
    let max_offset = max_scroll_offset(lines.len(), chunks[0].height.saturating_sub(1));
    let scroll = if app.ui.auto_scroll {
        max_offset
    } else {
        app.ui.scroll_offset.min(max_offset)
    };

    let transcript = Paragraph::new(lines)
        .block(Block::default().title("Peanut Chat"))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(transcript, chunks[0]);

    let status = app.ui.status.clone().unwrap_or_else(|| {
        if app.session.is_awaiting() {
            "Waiting for response... Esc stops it.".to_string()
        } else {
            "Enter to send · /help for commands · Ctrl+C to quit".to_string()
        }
    });
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            status,
            Style::default().fg(Color::DarkGray),
        ))),
        chunks[1],
    );

    let input_title = if app.session.is_awaiting() {
        "Awaiting response...".to_string()
    } else {
        format!(
            "Message (temp {:.2})",
            app.session.config().temperature()
        )
    };
    let input_block = Block::default().borders(Borders::ALL).title(input_title);
    let input_area = input_block.inner(chunks[2]);
    f.render_widget(input_block, chunks[2]);
    f.render_widget(&app.ui.input, input_area);

    if app.ui.mode == AppMode::PromptEditor {
        let overlay = centered_rect(80, 60, f.area());
        f.render_widget(Clear, overlay);
        let editor_block = Block::default()
            .borders(Borders::ALL)
            .title("Edit System Prompt (Ctrl+S to save, Esc to cancel)");
        let editor_area = editor_block.inner(overlay);
        f.render_widget(editor_block, overlay);
        f.render_widget(&app.ui.prompt_editor, editor_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn test_app() -> App {
        App::new(Config::default())
    }

    #[test]
    fn each_message_gets_a_spacer_line() {
        let mut app = test_app();
        app.session.append_user("Hi");
        app.session.append_assistant("Hello");

        let lines = build_transcript_lines(&app);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn user_lines_carry_the_you_prefix() {
        let mut app = test_app();
        app.session.append_user("Hi");

        let lines = build_transcript_lines(&app);
        assert_eq!(lines[0].spans[0].content, "You: ");
        assert_eq!(lines[0].spans[1].content, "Hi");
    }

    #[test]
    fn awaiting_adds_a_progress_line() {
        let mut app = test_app();
        app.session.append_user("Hi");
        let idle_count = build_transcript_lines(&app).len();

        let _handle = app.session.begin_request();
        let waiting = build_transcript_lines(&app);
        assert_eq!(waiting.len(), idle_count + 1);
    }

    #[test]
    fn scroll_offset_is_bounded_by_the_viewport() {
        assert_eq!(max_scroll_offset(10, 4), 6);
        assert_eq!(max_scroll_offset(3, 4), 0);
        assert_eq!(max_scroll_offset(4, 4), 0);
    }

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 100, 40);
        let overlay = centered_rect(80, 60, area);
        assert!(overlay.x >= area.x && overlay.right() <= area.right());
        assert!(overlay.y >= area.y && overlay.bottom() <= area.bottom());
    }
}
