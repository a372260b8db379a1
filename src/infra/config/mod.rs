mod app_config;
mod file_config;
mod loader;

pub use app_config::{AppConfig, IdentityConfig, LogConfig, ServerConfig, SessionSettings};
pub use loader::load;
