use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::infra::{config::LogConfig, error::AppError};

/// Installs the global subscriber. `RUST_LOG` overrides the configured
/// level. With `logging.file` set, output is appended there so it does not
/// interleave with the chat shell on the terminal.
pub fn init(config: &LogConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| AppError::LogFile {
                    path: path.clone(),
                    source,
                })?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(AppError::LoggingInit)
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(AppError::LoggingInit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = LogConfig {
            level: "info".to_owned(),
            file: Some(dir.path().join("missing").join("gigchat.log")),
        };

        let error = init(&config).expect_err("parent directory does not exist");

        match error {
            AppError::LogFile { path, .. } => {
                assert_eq!(path, dir.path().join("missing").join("gigchat.log"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
