//! Incoming replies.

/// Marker camerad sends when a command finished successfully.
pub const DONE: &str = "DONE";
/// Marker camerad sends when a command failed.
pub const ERROR: &str = "ERROR";

/// How a reply ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The reply contained `DONE`.
    Complete,
    /// A terminator arrived without `DONE` (usually `ERROR`).
    Incomplete,
    /// No data arrived within the reply timeout.
    TimedOut,
    /// The peer closed the connection before terminating the reply.
    Closed,
}

/// A reply received from one camerad host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    raw: String,
    outcome: ReplyOutcome,
}

/// Returns true once the accumulated text ends a reply.
pub fn is_terminated(text: &str) -> bool {
    text.contains(DONE) || text.contains(ERROR) || text.contains('\n')
}

impl Reply {
    /// Classifies a terminated reply.
    pub fn from_text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let outcome = if raw.contains(DONE) {
            ReplyOutcome::Complete
        } else {
            ReplyOutcome::Incomplete
        };
        Self { raw, outcome }
    }

    /// A reply cut short by the read timeout.
    pub fn timed_out(partial: impl Into<String>) -> Self {
        Self {
            raw: partial.into(),
            outcome: ReplyOutcome::TimedOut,
        }
    }

    /// A reply cut short by the peer closing the socket.
    pub fn closed(partial: impl Into<String>) -> Self {
        Self {
            raw: partial.into(),
            outcome: ReplyOutcome::Closed,
        }
    }

    /// The raw reply text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// How the reply ended.
    pub fn outcome(&self) -> ReplyOutcome {
        self.outcome
    }

    /// Returns true if the host reported the command done.
    pub fn is_complete(&self) -> bool {
        self.outcome == ReplyOutcome::Complete
    }

    /// The return value: the first whitespace-separated word.
    ///
    /// Only terminated replies carry a value; a partial reply from a
    /// timeout or hangup has none.
    pub fn value(&self) -> Option<&str> {
        match self.outcome {
            ReplyOutcome::Complete | ReplyOutcome::Incomplete => self.raw.split_whitespace().next(),
            ReplyOutcome::TimedOut | ReplyOutcome::Closed => None,
        }
    }
}
