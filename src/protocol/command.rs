//! Outgoing command lines.

use std::fmt;

/// Line terminator appended to every command.
pub const END_CHAR: char = '\n';

/// A command for camerad: a name followed by zero or more arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    words: Vec<String>,
}

impl Command {
    /// Starts a command with the given name.
    pub fn new(name: impl fmt::Display) -> Self {
        Self {
            words: vec![name.to_string()],
        }
    }

    /// Builds a command from any sequence of displayable words.
    pub fn from_words<I, T>(words: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        Self {
            words: words.into_iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.words.push(value.to_string());
        self
    }

    /// The first word that would split the line in two, if any.
    ///
    /// camerad reads one command per line, so a word carrying `\r` or
    /// `\n` would smuggle in a second command.
    pub fn line_break_word(&self) -> Option<&str> {
        self.words
            .iter()
            .map(String::as_str)
            .find(|w| w.contains(['\r', '\n']))
    }

    /// Returns true if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.trim().is_empty())
    }

    /// The terminated line as sent on the wire.
    pub fn to_line(&self) -> String {
        let mut line = self.words.join(" ");
        line.push(END_CHAR);
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}
