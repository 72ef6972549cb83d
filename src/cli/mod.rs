//! Command-line interface parsing and runtime entry.

use std::error::Error;

use clap::Parser;

use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "peanut")]
#[command(about = "A terminal chat front-end for a locally hosted completion API")]
#[command(
    long_about = "Peanut is a full-screen terminal chat front-end that relays the \
conversation, a configurable system prompt, and a sampling temperature to a \
locally hosted completions endpoint.\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message (Alt+Enter for a newline)\n\
  Esc               Stop the in-flight response\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             List commands\n\
  /dump [file]      Write the conversation as plain text\n\
  /save [file]      Write the conversation as JSON\n\
  /load <file>      Replace the conversation from a JSON file\n\
  /prompt           Edit, save, or load the system prompt\n\
  /temp [value]     Show or set the sampling temperature"
)]
pub struct Args {
    /// Base URL of the completions endpoint
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing();

    let mut config = Config::load()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    run_chat(config).await
}

/// Diagnostics go to stderr and are filtered by `RUST_LOG`; with the
/// variable unset nothing is emitted, which keeps the alternate screen
/// clean.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_flag_is_parsed() {
        let args = Args::parse_from(["peanut", "--endpoint", "http://127.0.0.1:9000/v1"]);
        assert_eq!(args.endpoint.as_deref(), Some("http://127.0.0.1:9000/v1"));
    }

    #[test]
    fn endpoint_flag_is_optional() {
        let args = Args::parse_from(["peanut"]);
        assert!(args.endpoint.is_none());
    }
}
