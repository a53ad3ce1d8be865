//! Synchronization strategy selector.
//!
//! Fixed at store construction. A store never switches strategy while it is
//! alive; build a new store (or a new [`crate::AppContext`]) instead.

use serde::{Deserialize, Serialize};

/// Which backing source a store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// The remote service is the source of truth.
    #[default]
    Remote,
    /// Local state only: the persistent cache for products, session memory
    /// for purchases.
    Local,
}

impl SyncStrategy {
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for SyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            _ => Err(format!("invalid sync strategy: {s} (expected `remote` or `local`)")),
        }
    }
}
