//! Parsing of interactive shell lines.

use super::CameraCommand;
use clap::{Parser, Subcommand};

/// What the shell should do with one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellAction {
    /// Run a camera command.
    Run(CameraCommand),
    /// Close the camera and leave the shell.
    Quit,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Camera(CameraCommand),
    /// Close the camera and exit the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parses one shell line.
///
/// Blank lines and `#` comments yield `Ok(None)`. `help` and parse errors
/// come back as a [`clap::Error`] whose rendering is meant for the user.
pub fn parse_line(line: &str) -> Result<Option<ShellAction>, clap::Error> {
    // a comment starts at a word beginning with '#'
    let words: Vec<&str> = line
        .split_whitespace()
        .take_while(|word| !word.starts_with('#'))
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    let parsed = ShellLine::try_parse_from(words)?;
    Ok(Some(match parsed.command {
        ShellCommand::Camera(command) => ShellAction::Run(command),
        ShellCommand::Quit => ShellAction::Quit,
    }))
}
