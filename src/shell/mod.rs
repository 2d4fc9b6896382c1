//! Command surface shared by the CLI and the interactive shell.
//!
//! The same [`CameraCommand`] set is used for one-shot invocations
//! (`camerad-client expose 0 3`) and for lines typed at the shell prompt
//! (`expose 0 3`), so scripts and interactive sessions behave alike.

mod command;
mod line;

pub use command::{execute, CameraCommand};
pub use line::{parse_line, ShellAction};
