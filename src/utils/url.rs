//! Endpoint URL construction.

/// Joins a base URL and an endpoint path without producing double slashes.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_endpoint() {
        assert_eq!(
            construct_api_url("http://localhost:30000/v1", "chat/completions"),
            "http://localhost:30000/v1/chat/completions"
        );
    }

    #[test]
    fn strips_redundant_slashes() {
        assert_eq!(
            construct_api_url("http://localhost:30000/v1/", "/chat/completions"),
            "http://localhost:30000/v1/chat/completions"
        );
    }
}
