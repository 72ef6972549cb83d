//! Peanut is a terminal chat front-end for a locally hosted completion API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation session state machine, the transcript
//!   model, and application configuration.
//! - [`api`] defines the wire payloads and the completion client that
//!   performs the HTTP exchange with the backend.
//! - [`commands`] implements slash-command parsing for the file-exchange
//!   and settings surfaces.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
