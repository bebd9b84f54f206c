use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Hosted backend coordinates. The API key is a public client key, not a
/// secret in the cryptographic sense, but it is still kept out of logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Firebase project id, e.g. "my-chat-app".
    pub project_id: String,
    /// Web API key for the Identity Toolkit endpoints.
    pub api_key: String,
    /// Interval between snapshot polls of the live feeds.
    pub poll_interval_ms: u64,
    /// Per-request timeout toward the backend.
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            poll_interval_ms: 2_000,
            request_timeout_ms: 10_000,
        }
    }
}
