use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "List available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "dump",
        usage: "/dump [filename]",
        help: "Write the conversation as plain text.",
        handler: super::handle_dump,
    },
    Command {
        name: "save",
        usage: "/save [filename]",
        help: "Write the conversation as JSON for later /load.",
        handler: super::handle_save,
    },
    Command {
        name: "load",
        usage: "/load <filename>",
        help: "Replace the conversation from a JSON file.",
        handler: super::handle_load,
    },
    Command {
        name: "prompt",
        usage: "/prompt [save|load] [filename]",
        help: "Edit, save, or load the system prompt.",
        handler: super::handle_prompt,
    },
    Command {
        name: "temp",
        usage: "/temp [value]",
        help: "Show or set the sampling temperature (0.0 to 1.0).",
        handler: super::handle_temp,
    },
];
