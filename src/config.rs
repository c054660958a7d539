//! Runtime settings for the preview surface.

use serde::{Deserialize, Serialize};

/// Environment variable naming the chat backend base URL.
pub const API_URL_VAR: &str = "FINCH_API_URL";
/// Environment variable carrying the bearer token, read per send.
pub const API_TOKEN_VAR: &str = "FINCH_API_TOKEN";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Resolved settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the chat backend.
    pub api_url: String,
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { api_url }
    }

    /// Resolve settings with an explicit override taking precedence.
    pub fn with_api_url(api_url: Option<String>) -> Self {
        match api_url {
            Some(url) if !url.is_empty() => Self { api_url: url },
            _ => Self::from_env(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "http://localhost:8080/api");
    }

    #[test]
    fn explicit_override_wins() {
        let settings = Settings::with_api_url(Some("https://agents.example/api".into()));
        assert_eq!(settings.api_url, "https://agents.example/api");
    }

    #[test]
    fn empty_override_falls_through() {
        let settings = Settings::with_api_url(Some(String::new()));
        assert!(!settings.api_url.is_empty());
    }
}
