//! camerad line protocol.
//!
//! Commands are space-separated words terminated by a newline. A reply is
//! read until it carries `DONE`, `ERROR` or a newline; `DONE` anywhere in
//! the reply marks the command as completed by that host.
//!
//! ```text
//! client ── "setp BitLevel 2\n" ──► camerad
//! client ◄──── "DONE\n" ─────────── camerad
//! ```
//!
//! When several hosts serve one camera, their replies are combined by
//! [`aggregate`].

mod aggregate;
mod command;
mod reply;

pub use aggregate::{aggregate, Aggregate, HostReply};
pub use command::Command;
pub use reply::{is_terminated, Reply, ReplyOutcome};
