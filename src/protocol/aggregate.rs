//! Combining replies from several hosts into one result.

use super::Reply;

/// A reply tagged with the name of the host that sent it.
#[derive(Debug, Clone)]
pub struct HostReply {
    /// Host name from the host table.
    pub host: String,
    /// The reply itself.
    pub reply: Reply,
}

impl HostReply {
    /// Tags a reply with its host name.
    pub fn new(host: impl Into<String>, reply: Reply) -> Self {
        Self {
            host: host.into(),
            reply,
        }
    }
}

/// Combined result of one command across all connected hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Every host completed and returned the same value.
    Agreed(String),
    /// Hosts returned different values, listed per host in send order.
    Divergent(Vec<(String, String)>),
    /// These hosts did not report completion.
    Failed(Vec<String>),
}

/// Combines per-host replies.
///
/// Divergent return values take precedence over incomplete hosts, so a
/// caller always learns when the cameras disagree.
pub fn aggregate(replies: &[HostReply]) -> Aggregate {
    let values: Vec<(String, String)> = replies
        .iter()
        .filter_map(|r| r.reply.value().map(|v| (r.host.clone(), v.to_string())))
        .collect();

    if values.windows(2).any(|pair| pair[0].1 != pair[1].1) {
        return Aggregate::Divergent(values);
    }

    let failed: Vec<String> = replies
        .iter()
        .filter(|r| !r.reply.is_complete())
        .map(|r| r.host.clone())
        .collect();

    match values.into_iter().last() {
        Some((_, value)) if failed.is_empty() => Aggregate::Agreed(value),
        _ if replies.is_empty() => Aggregate::Failed(Vec::new()),
        _ => Aggregate::Failed(failed),
    }
}
