use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    domain::compose::DraftPolicy,
    infra::config::{AppConfig, IdentityConfig, LogConfig, ServerConfig, SessionSettings},
};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub server: Option<FileServerConfig>,
    pub identity: Option<FileIdentityConfig>,
    pub session: Option<FileSessionConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(server) = self.server {
            server.merge_into(&mut config.server);
        }

        if let Some(identity) = self.identity {
            identity.merge_into(&mut config.identity);
        }

        if let Some(session) = self.session {
            session.merge_into(&mut config.session);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if self.file.is_some() {
            config.file = self.file;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileServerConfig {
    pub api_base_url: Option<String>,
    pub websocket_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

impl FileServerConfig {
    fn merge_into(self, config: &mut ServerConfig) {
        if let Some(url) = self.api_base_url {
            config.api_base_url = url;
        }

        if let Some(url) = self.websocket_url {
            config.websocket_url = url;
        }

        if let Some(timeout_ms) = self.request_timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FileIdentityConfig {
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
}

impl FileIdentityConfig {
    fn merge_into(self, config: &mut IdentityConfig) {
        if self.user_id.is_some() {
            config.user_id = self.user_id;
        }

        if self.auth_token.is_some() {
            config.auth_token = self.auth_token;
        }
    }
}

impl std::fmt::Debug for FileIdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIdentityConfig")
            .field("user_id", &self.user_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSessionConfig {
    pub typing_timeout_ms: Option<u64>,
    pub remote_typing_expiry_ms: Option<u64>,
    pub history_page_size: Option<usize>,
    pub draft_on_send_failure: Option<DraftPolicy>,
}

impl FileSessionConfig {
    fn merge_into(self, config: &mut SessionSettings) {
        if let Some(timeout_ms) = self.typing_timeout_ms {
            config.typing_timeout_ms = timeout_ms;
        }

        if let Some(expiry_ms) = self.remote_typing_expiry_ms {
            config.remote_typing_expiry_ms = expiry_ms;
        }

        if let Some(page_size) = self.history_page_size {
            config.history_page_size = page_size;
        }

        if let Some(policy) = self.draft_on_send_failure {
            config.draft_on_send_failure = policy;
        }
    }
}
