use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Logical clock attached to a primitive by its upstream source.
///
/// Combines the wall-clock time the source recorded the version with a
/// logical counter that orders versions stamped within the same millisecond.
///
/// Ordering: `physical_ms` → `logical` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionStamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Logical counter for versions at the same physical time.
    pub logical: u32,
}

impl VersionStamp {
    /// Create a stamp with explicit values.
    pub fn new(physical_ms: u64, logical: u32) -> Self {
        Self {
            physical_ms,
            logical,
        }
    }

    /// Create a stamp for the current wall-clock time.
    pub fn now() -> Self {
        let physical_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            physical_ms,
            logical: 0,
        }
    }

    /// The zero stamp.
    pub const fn zero() -> Self {
        Self {
            physical_ms: 0,
            logical: 0,
        }
    }

    /// Returns `true` if this stamp is strictly newer than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns `true` if this stamp is strictly older than `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns `true` if `candidate` is strictly newer than `current`.
    ///
    /// A present stamp is newer than an absent one; an absent candidate is
    /// never newer.
    pub fn is_newer(candidate: Option<&Self>, current: Option<&Self>) -> bool {
        match (candidate, current) {
            (Some(c), Some(cur)) => c.is_after(cur),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl PartialOrd for VersionStamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionStamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
    }
}

impl fmt::Debug for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionStamp({}ms.{})", self.physical_ms, self.logical)
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.physical_ms, self.logical)
    }
}
