//! Candidate-address routing.
//!
//! A rollup batcher hands every batch to the client together with the
//! address it would have been posted to. Only the reserved sentinel address
//! means "publish on the DA layer"; every other candidate belongs to some
//! other routing target and its data is handed back untouched.

/// Reserved candidate that always forces submission to the DA backend.
pub const SENTINEL_CANDIDATE: &str = "0xfF00000000000000000000000000000000000000";

pub const ADDRESS_LEN: usize = 20;

const SENTINEL_BYTES: [u8; ADDRESS_LEN] = {
    let mut b = [0u8; ADDRESS_LEN];
    b[0] = 0xff;
    b
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Submit to the configured DA backend.
    ForceSubmit,
    /// Not ours: return the caller's data unchanged.
    PassThrough,
}

impl Route {
    pub fn force_submit(self) -> bool {
        matches!(self, Route::ForceSubmit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionRouter {
    sentinel: [u8; ADDRESS_LEN],
}

impl Default for SubmissionRouter {
    fn default() -> Self {
        Self { sentinel: SENTINEL_BYTES }
    }
}

impl SubmissionRouter {
    /// Router keyed on a custom sentinel (e.g. a chain-specific batcher inbox).
    pub fn with_sentinel(sentinel: [u8; ADDRESS_LEN]) -> Self {
        Self { sentinel }
    }

    /// Addresses compare as 20 raw bytes, so checksum casing is irrelevant.
    /// Anything that does not parse as an address is never the sentinel.
    pub fn route(&self, candidate_hex: &str) -> Route {
        match parse_address(candidate_hex) {
            Some(addr) if addr == self.sentinel => Route::ForceSubmit,
            _ => Route::PassThrough,
        }
    }
}

/// Parse a `0x`-prefixed (or bare) 40-hex-digit address.
pub fn parse_address(candidate_hex: &str) -> Option<[u8; ADDRESS_LEN]> {
    let digits = candidate_hex
        .strip_prefix("0x")
        .or_else(|| candidate_hex.strip_prefix("0X"))
        .unwrap_or(candidate_hex);
    let mut out = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(digits, &mut out).ok()?;
    Some(out)
}
