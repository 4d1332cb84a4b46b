//! Internal verify implementation modules.
//!
//! `crate::verify` is the public facade. This module owns the per-entry
//! strategies and shared checks.

use std::fmt;

pub(crate) mod checks;
pub(crate) mod offline;
pub(crate) mod online;
pub(crate) mod policy;

pub(crate) use online::OnlineStrategy;

/// How each entry is proven to have been accepted by a log.
///
/// Fixed when the verifier is built.
pub(crate) enum Strategy {
    /// Signed entry timestamp checked against the trusted root.
    Offline,

    /// Entry re-fetched from its log and checked against the log's live key.
    Online(OnlineStrategy),
}

impl Strategy {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online(_) => "online",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("Offline"),
            Self::Online(online) => f.debug_tuple("Online").field(online).finish(),
        }
    }
}
