//! Opaque scan identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one scan registered with a scan registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanHandle(pub u64);

impl ScanHandle {
    /// Create a new handle from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan #{}", self.0)
    }
}
