use std::{fmt, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{domain::compose::DraftPolicy, usecases::chat_session::SessionConfig};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub session: SessionSettings,
}

impl AppConfig {
    /// Copy safe to print: credentials are masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.identity.auth_token.is_some() {
            config.identity.auth_token = Some(REDACTED.to_owned());
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// When set, logs go to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub api_base_url: String,
    pub websocket_url: String,
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_owned(),
            websocket_url: "ws://localhost:5000/ws".to_owned(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IdentityConfig {
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("user_id", &self.user_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSettings {
    pub typing_timeout_ms: u64,
    pub remote_typing_expiry_ms: u64,
    pub history_page_size: usize,
    pub draft_on_send_failure: DraftPolicy,
}

impl SessionSettings {
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            typing_timeout: Duration::from_millis(self.typing_timeout_ms),
            remote_typing_expiry: Duration::from_millis(self.remote_typing_expiry_ms),
            history_page_size: self.history_page_size,
            draft_on_send_failure: self.draft_on_send_failure,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            typing_timeout_ms: 3_000,
            remote_typing_expiry_ms: 3_000,
            history_page_size: 50,
            draft_on_send_failure: DraftPolicy::Retain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_settings_match_session_defaults() {
        assert_eq!(
            SessionSettings::default().to_session_config(),
            SessionConfig::default()
        );
    }

    #[test]
    fn debug_and_redacted_copies_hide_the_token() {
        let mut config = AppConfig::default();
        config.identity.auth_token = Some("eyJhbGciOi.secret".to_owned());

        assert!(!format!("{:?}", config).contains("eyJhbGciOi"));
        assert_eq!(
            config.redacted().identity.auth_token.as_deref(),
            Some(REDACTED)
        );
    }
}
