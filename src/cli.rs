use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gigchat", about = "Terminal chat client for marketplace conversations")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open a conversation in the chat shell
    Chat {
        /// Conversation to open
        #[arg(long)]
        conversation: String,
    },
    /// Print the effective configuration with secrets masked
    Config,
}
