//! Slash-command parsing and execution.
//!
//! Commands cover the file-exchange and settings surfaces: transcript
//! dump/save/load, system prompt save/load/edit, and the temperature
//! setting. Anything that does not parse as a command is treated as a
//! chat message.

mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation};

use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::core::app::App;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    OpenPromptEditor,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

pub(crate) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let summary = all_commands()
        .iter()
        .map(|command| command.usage)
        .collect::<Vec<_>>()
        .join("  ");
    app.set_status(format!("Commands: {summary}"));
    CommandResult::Continue
}

pub(crate) fn handle_dump(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if app.session.transcript().is_empty() {
        app.set_status("No conversation to dump - the chat history is empty.");
        return CommandResult::Continue;
    }

    let (path, explicit) = match invocation.args {
        "" => {
            let date = Utc::now().format("%Y-%m-%d");
            (
                app.config.history_dir.join(format!("peanut-log-{date}.txt")),
                false,
            )
        }
        filename => (PathBuf::from(filename), true),
    };

    if !explicit && path.exists() {
        app.set_status(format!(
            "File '{}' already exists. Pass a filename to overwrite.",
            path.display()
        ));
        return CommandResult::Continue;
    }

    let mut text = app.session.export_transcript_text();
    text.push('\n');
    match fs::write(&path, text) {
        Ok(()) => app.set_status(format!("Dumped: {}", path.display())),
        Err(e) => app.set_status(format!("Dump error: {e}")),
    }
    CommandResult::Continue
}

pub(crate) fn handle_save(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if app.session.transcript().is_empty() {
        app.set_status("No conversation to save - the chat history is empty.");
        return CommandResult::Continue;
    }

    let (path, explicit) = match invocation.args {
        "" => {
            let date = Utc::now().format("%Y-%m-%d");
            (
                app.config
                    .history_dir
                    .join(format!("peanut-history-{date}.json")),
                false,
            )
        }
        filename => (PathBuf::from(filename), true),
    };

    if !explicit && path.exists() {
        app.set_status(format!(
            "File '{}' already exists. Pass a filename to overwrite.",
            path.display()
        ));
        return CommandResult::Continue;
    }

    let json = match app.session.export_transcript_json() {
        Ok(json) => json,
        Err(e) => {
            app.set_status(format!("Save error: {e}"));
            return CommandResult::Continue;
        }
    };

    match fs::write(&path, json) {
        Ok(()) => app.set_status(format!("Saved: {}", path.display())),
        Err(e) => app.set_status(format!("Save error: {e}")),
    }
    CommandResult::Continue
}

pub(crate) fn handle_load(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.set_status("Usage: /load <filename>");
        return CommandResult::Continue;
    }
    if app.session.is_awaiting() {
        app.set_status("Cannot load history while a response is pending.");
        return CommandResult::Continue;
    }

    let raw = match fs::read_to_string(invocation.args) {
        Ok(raw) => raw,
        Err(e) => {
            app.set_status(format!("Load error: {e}"));
            return CommandResult::Continue;
        }
    };

    match app.session.import_transcript(&raw) {
        Ok(()) => app.set_status("Chat history loaded!"),
        Err(e) => app.set_status(format!("Load error: {e}")),
    }
    CommandResult::Continue
}

pub(crate) fn handle_prompt(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let mut parts = invocation.args.splitn(2, ' ');
    match parts.next().unwrap_or("") {
        "" => CommandResult::OpenPromptEditor,
        "save" => {
            let path = match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
                Some(filename) => PathBuf::from(filename),
                None => app.config.prompt_dir.join("system_prompt.txt"),
            };
            match fs::write(&path, &app.session.config().system_prompt) {
                Ok(()) => app.set_status(format!("Prompt saved: {}", path.display())),
                Err(e) => app.set_status(format!("Prompt error: {e}")),
            }
            CommandResult::Continue
        }
        "load" => {
            let Some(filename) = parts.next().map(str::trim).filter(|s| !s.is_empty()) else {
                app.set_status("Usage: /prompt load <filename>");
                return CommandResult::Continue;
            };
            match fs::read_to_string(filename) {
                Ok(raw) => {
                    app.session.load_system_prompt(&raw);
                    app.set_status("Prompt loaded!");
                }
                Err(e) => app.set_status(format!("Prompt error: {e}")),
            }
            CommandResult::Continue
        }
        _ => {
            app.set_status("Usage: /prompt [save|load] [filename]");
            CommandResult::Continue
        }
    }
}

pub(crate) fn handle_temp(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.set_status(format!(
            "Temperature: {:.2}",
            app.session.config().temperature()
        ));
        return CommandResult::Continue;
    }

    match invocation.args.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            app.session.set_temperature(value);
            app.set_status(format!(
                "Temperature set to {:.2}",
                app.session.config().temperature()
            ));
        }
        _ => app.set_status("Usage: /temp [value between 0.0 and 1.0]"),
    }
    CommandResult::Continue
}
