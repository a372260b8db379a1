use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{domain::events::ShellCommand, usecases::contracts::CommandSource};

/// Reads one command per line from stdin.
pub struct StdinCommandSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinCommandSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }
}

impl Default for StdinCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSource for StdinCommandSource {
    async fn next_command(&mut self) -> Result<Option<ShellCommand>> {
        // `next_line` is cancel safe, so this can sit in a `select!`.
        while let Some(line) = self.lines.next_line().await? {
            if let Some(command) = parse_line(&line) {
                return Ok(Some(command));
            }
        }

        Ok(None)
    }
}

/// Maps an input line to a command. Blank lines map to nothing.
///
/// `/quit`, `/focus` and `/retry` are control commands, `/draft <text>`
/// replaces the draft without sending and anything else is sent as a
/// message.
pub fn parse_line(line: &str) -> Option<ShellCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let command = match trimmed {
        "/quit" | "/q" => ShellCommand::Quit,
        "/focus" => ShellCommand::Focus,
        "/retry" => ShellCommand::Retry,
        "/draft" => ShellCommand::Draft(String::new()),
        _ => match trimmed.strip_prefix("/draft ") {
            Some(text) => ShellCommand::Draft(text.to_owned()),
            None => ShellCommand::Send(line.trim_end_matches(['\r', '\n']).to_owned()),
        },
    };

    Some(command)
}

#[cfg(test)]
pub struct MockCommandSource {
    queue: std::collections::VecDeque<ShellCommand>,
}

#[cfg(test)]
impl MockCommandSource {
    pub fn from(commands: Vec<ShellCommand>) -> Self {
        Self {
            queue: commands.into(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CommandSource for MockCommandSource {
    async fn next_command(&mut self) -> Result<Option<ShellCommand>> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_commands() {
        assert_eq!(parse_line("/quit"), Some(ShellCommand::Quit));
        assert_eq!(parse_line("  /focus "), Some(ShellCommand::Focus));
        assert_eq!(parse_line("/retry"), Some(ShellCommand::Retry));
    }

    #[test]
    fn draft_command_keeps_inner_spacing() {
        assert_eq!(
            parse_line("/draft  running late"),
            Some(ShellCommand::Draft(" running late".to_owned()))
        );
        assert_eq!(parse_line("/draft"), Some(ShellCommand::Draft(String::new())));
    }

    #[test]
    fn plain_text_is_sent_and_blank_lines_are_skipped() {
        assert_eq!(
            parse_line("Hello there\n"),
            Some(ShellCommand::Send("Hello there".to_owned()))
        );
        assert_eq!(parse_line("   "), None);
    }

    #[tokio::test]
    async fn mock_source_drains_then_ends() {
        let mut source = MockCommandSource::from(vec![ShellCommand::Quit]);

        assert_eq!(
            source.next_command().await.expect("mock"),
            Some(ShellCommand::Quit)
        );
        assert_eq!(source.next_command().await.expect("mock"), None);
    }
}
