use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path,
        source,
    })?;

    file_config.merge_into(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::compose::DraftPolicy;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("must write test config");
        (dir, path)
    }

    #[test]
    fn returns_defaults_when_file_is_missing() {
        let config = load(Some(Path::new("./missing-config.toml"))).expect("config must load");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn merges_file_values_over_defaults() {
        let (_dir, path) = write_config(
            r#"[logging]
level = "debug"
file = "gigchat.log"

[server]
api_base_url = "https://api.example.com"

[identity]
user_id = "u-42"
auth_token = "abc"

[session]
typing_timeout_ms = 1500
draft_on_send_failure = "clear"
"#,
        );

        let config = load(Some(&path)).expect("config must load");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("gigchat.log")));
        assert_eq!(config.server.api_base_url, "https://api.example.com");
        assert_eq!(config.server.websocket_url, "ws://localhost:5000/ws");
        assert_eq!(config.identity.user_id.as_deref(), Some("u-42"));

        let session = config.session.to_session_config();
        assert_eq!(session.typing_timeout, Duration::from_millis(1_500));
        assert_eq!(session.remote_typing_expiry, Duration::from_secs(3));
        assert_eq!(session.history_page_size, 50);
        assert_eq!(session.draft_on_send_failure, DraftPolicy::Clear);
    }

    #[test]
    fn rejects_unknown_draft_policy() {
        let (_dir, path) = write_config("[session]\ndraft_on_send_failure = \"discard\"\n");

        let error = load(Some(&path)).expect_err("policy must be validated");

        assert!(matches!(error, AppError::ConfigParse { .. }));
    }
}
