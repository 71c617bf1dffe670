use serde::Deserialize;

use crate::infra::config::{AppConfig, ChatConfig, FirebaseConfig, LogConfig, StartupConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub firebase: Option<FileFirebaseConfig>,
    pub chat: Option<FileChatConfig>,
    pub startup: Option<FileStartupConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(firebase) = self.firebase {
            firebase.merge_into(&mut config.firebase);
        }

        if let Some(chat) = self.chat {
            chat.merge_into(&mut config.chat);
        }

        if let Some(startup) = self.startup {
            startup.merge_into(&mut config.startup);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileFirebaseConfig {
    pub api_key: Option<String>,
    pub database_url: Option<String>,
    pub storage_bucket: Option<String>,
    pub messages_path: Option<String>,
    pub photos_prefix: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub storage_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub stream_reconnect_delay_ms: Option<u64>,
}

impl FileFirebaseConfig {
    fn merge_into(self, config: &mut FirebaseConfig) {
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }

        if let Some(database_url) = self.database_url {
            config.database_url = trim_trailing_slash(database_url);
        }

        if let Some(storage_bucket) = self.storage_bucket {
            config.storage_bucket = storage_bucket;
        }

        if let Some(messages_path) = self.messages_path {
            config.messages_path = messages_path.trim_matches('/').to_owned();
        }

        if let Some(photos_prefix) = self.photos_prefix {
            config.photos_prefix = photos_prefix.trim_matches('/').to_owned();
        }

        if let Some(auth_url) = self.auth_url {
            config.auth_url = trim_trailing_slash(auth_url);
        }

        if let Some(token_url) = self.token_url {
            config.token_url = trim_trailing_slash(token_url);
        }

        if let Some(storage_url) = self.storage_url {
            config.storage_url = trim_trailing_slash(storage_url);
        }

        if let Some(timeout_ms) = self.request_timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }

        if let Some(delay_ms) = self.stream_reconnect_delay_ms {
            config.stream_reconnect_delay_ms = delay_ms;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileChatConfig {
    pub message_length_limit: Option<usize>,
    pub anonymous_name: Option<String>,
    pub pause_on_focus_loss: Option<bool>,
}

impl FileChatConfig {
    fn merge_into(self, config: &mut ChatConfig) {
        if let Some(limit) = self.message_length_limit {
            config.message_length_limit = limit;
        }

        if let Some(anonymous_name) = self.anonymous_name {
            config.anonymous_name = anonymous_name;
        }

        if let Some(pause) = self.pause_on_focus_loss {
            config.pause_on_focus_loss = pause;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileStartupConfig {
    pub session_probe_timeout_ms: Option<u64>,
}

impl FileStartupConfig {
    fn merge_into(self, config: &mut StartupConfig) {
        if let Some(timeout_ms) = self.session_probe_timeout_ms {
            config.session_probe_timeout_ms = timeout_ms;
        }
    }
}

fn trim_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}
