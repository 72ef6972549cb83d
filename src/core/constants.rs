//! Shared constants used across the application

use std::time::Duration;

/// Base URL of the local completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:30000/v1";

/// System prompt installed when no override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Sampling temperature installed when no override is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound on a single completion exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Substituted for the backend's answer when the user stopped the request.
/// The wording is part of the user-visible contract; do not change it.
pub const RESPONSE_STOPPED: &str = "Response stopped by user.";

/// Returned on a 200 response that carries no usable choice content.
pub const ERROR_NO_CONTENT: &str = "Error: No content in response.";

/// Returned for any transport, status, or body failure.
pub const ERROR_UNREACHABLE: &str = "Error: Unable to connect to the model.";
