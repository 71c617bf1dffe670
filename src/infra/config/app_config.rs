use serde::{Deserialize, Serialize};

use crate::{domain::message::ANONYMOUS, infra::error::AppError};

/// Placeholder shipped in the default config; must be replaced before connecting.
pub const PLACEHOLDER_API_KEY: &str = "replace-me";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub firebase: FirebaseConfig,
    pub chat: ChatConfig,
    pub startup: StartupConfig,
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub database_url: String,
    pub storage_bucket: String,
    pub messages_path: String,
    pub photos_prefix: String,
    pub auth_url: String,
    pub token_url: String,
    pub storage_url: String,
    pub request_timeout_ms: u64,
    pub stream_reconnect_delay_ms: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_owned(),
            database_url: String::new(),
            storage_bucket: String::new(),
            messages_path: "messages".to_owned(),
            photos_prefix: "chat_photos".to_owned(),
            auth_url: "https://identitytoolkit.googleapis.com".to_owned(),
            token_url: "https://securetoken.googleapis.com".to_owned(),
            storage_url: "https://firebasestorage.googleapis.com".to_owned(),
            request_timeout_ms: 15_000,
            stream_reconnect_delay_ms: 2_000,
        }
    }
}

impl FirebaseConfig {
    /// Checks that the project coordinates were filled in.
    pub fn validate(&self) -> Result<(), AppError> {
        let api_key = self.api_key.trim();
        let missing = [
            (
                "firebase.api_key",
                api_key.is_empty() || api_key == PLACEHOLDER_API_KEY,
            ),
            ("firebase.database_url", self.database_url.trim().is_empty()),
            (
                "firebase.storage_bucket",
                self.storage_bucket.trim().is_empty(),
            ),
            (
                "firebase.messages_path",
                self.messages_path.trim_matches('/').is_empty(),
            ),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::ConfigInvalid {
                details: format!("missing values for {}", missing.join(", ")),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    pub message_length_limit: usize,
    pub anonymous_name: String,
    pub pause_on_focus_loss: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_length_limit: 1_000,
            anonymous_name: ANONYMOUS.to_owned(),
            pause_on_focus_loss: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartupConfig {
    pub session_probe_timeout_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            session_probe_timeout_ms: 1_500,
        }
    }
}
