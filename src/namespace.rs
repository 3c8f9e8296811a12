use serde::{Deserialize, Serialize};

/// Logical partition of the DA backend's address space.
///
/// Fixed when a client is constructed and owned by that client for its whole
/// lifetime. An `id` of zero means "no namespace" to the native backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub version: u8,
    pub id:      u32,
}

impl Namespace {
    pub fn new(version: u8, id: u32) -> Self {
        Self { version, id }
    }

    /// Whether this namespace selects a partition at all.
    pub fn is_set(&self) -> bool {
        self.id > 0
    }

    /// `version ‖ id` (big-endian), used when deriving transaction ids.
    pub fn to_bytes(self) -> [u8; 5] {
        let mut out = [0u8; 5];
        out[0] = self.version;
        out[1..].copy_from_slice(&self.id.to_be_bytes());
        out
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}:{}", self.version, self.id)
    }
}
