//! TCP links to camerad hosts.
//!
//! Each host gets its own [`HostConnection`]. Connections know nothing
//! about other hosts; fan-out and reply aggregation live in the session.

mod link;

pub use link::{ConnectionError, HostConnection};
