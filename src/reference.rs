//! Fixed-layout binary references to blobs stored on the DA layer.
//!
//! Two layouts exist and neither is self-describing on the wire, so the
//! variant is always chosen by the caller through [`ReferenceKind`]:
//!
//! ```text
//!   FrameRef (legacy, 64 B)   [ tx_id: 32 B ][ commitment: 32 B ]
//!   BlobRef  (compact, 32 B)  [ tx_id: 32 B ]
//! ```
//!
//! A 64-byte frame reference always starts with a valid 32-byte blob
//! reference, which is why decoding never sniffs the length.
//!
//! `FrameRef::decode` accepts trailing bytes past offset 64 (padding is
//! ignored). `BlobRef::decode` is strict: exactly 32 bytes or nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::{Commitment, TxId, COMMITMENT_LEN, TX_ID_LEN};

pub const FRAME_REF_LEN: usize = TX_ID_LEN + COMMITMENT_LEN;
pub const BLOB_REF_LEN:  usize = TX_ID_LEN;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("invalid size: {kind} reference needs {expected} bytes, got {actual}")]
    InvalidSize {
        kind:     ReferenceKind,
        expected: usize,
        actual:   usize,
    },
}

// ── Variant selector ─────────────────────────────────────────────────────────

/// Which reference layout a client speaks. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Legacy 64-byte `tx_id ‖ commitment`.
    Frame,
    /// Compact 32-byte `tx_id`.
    Blob,
}

impl ReferenceKind {
    /// Encoded length of this variant.
    pub fn encoded_len(self) -> usize {
        match self {
            ReferenceKind::Frame => FRAME_REF_LEN,
            ReferenceKind::Blob  => BLOB_REF_LEN,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Reference, ReferenceError> {
        match self {
            ReferenceKind::Frame => FrameRef::decode(bytes).map(Reference::Frame),
            ReferenceKind::Blob  => BlobRef::decode(bytes).map(Reference::Blob),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReferenceKind::Frame => "frame",
            ReferenceKind::Blob  => "blob",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "frame" | "legacy"  => Some(ReferenceKind::Frame),
            "blob"  | "compact" => Some(ReferenceKind::Blob),
            _                   => None,
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Legacy frame reference ──────────────────────────────────────────────────

/// Legacy reference: the transaction id plus the commitment the blob is
/// expected to hash to. Retrieval through a frame reference is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef {
    pub tx_id:      TxId,
    pub commitment: Commitment,
}

impl FrameRef {
    pub fn new(tx_id: TxId, commitment: Commitment) -> Self {
        Self { tx_id, commitment }
    }

    pub fn encode(&self) -> [u8; FRAME_REF_LEN] {
        let mut out = [0u8; FRAME_REF_LEN];
        out[..TX_ID_LEN].copy_from_slice(&self.tx_id);
        out[TX_ID_LEN..].copy_from_slice(&self.commitment);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ReferenceError> {
        if bytes.len() < FRAME_REF_LEN {
            return Err(ReferenceError::InvalidSize {
                kind:     ReferenceKind::Frame,
                expected: FRAME_REF_LEN,
                actual:   bytes.len(),
            });
        }
        let mut tx_id = [0u8; TX_ID_LEN];
        let mut commitment = [0u8; COMMITMENT_LEN];
        tx_id.copy_from_slice(&bytes[..TX_ID_LEN]);
        commitment.copy_from_slice(&bytes[TX_ID_LEN..FRAME_REF_LEN]);
        Ok(Self { tx_id, commitment })
    }
}

// ── Compact blob reference ──────────────────────────────────────────────────

/// Compact reference: the transaction id only. Integrity is left to the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobRef {
    pub tx_id: TxId,
}

impl BlobRef {
    pub fn new(tx_id: TxId) -> Self {
        Self { tx_id }
    }

    pub fn encode(&self) -> [u8; BLOB_REF_LEN] {
        self.tx_id
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ReferenceError> {
        let tx_id: TxId = bytes.try_into().map_err(|_| ReferenceError::InvalidSize {
            kind:     ReferenceKind::Blob,
            expected: BLOB_REF_LEN,
            actual:   bytes.len(),
        })?;
        Ok(Self { tx_id })
    }

    /// Lower-case hex of the transaction id, as the sidecar expects it.
    pub fn id_hex(&self) -> String {
        hex::encode(self.tx_id)
    }
}

impl From<FrameRef> for BlobRef {
    fn from(frame: FrameRef) -> Self {
        Self { tx_id: frame.tx_id }
    }
}

impl From<TxId> for BlobRef {
    fn from(tx_id: TxId) -> Self {
        Self { tx_id }
    }
}

// ── Tagged reference ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    Frame(FrameRef),
    Blob(BlobRef),
}

impl Reference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Reference::Frame(_) => ReferenceKind::Frame,
            Reference::Blob(_)  => ReferenceKind::Blob,
        }
    }

    pub fn tx_id(&self) -> &TxId {
        match self {
            Reference::Frame(f) => &f.tx_id,
            Reference::Blob(b)  => &b.tx_id,
        }
    }

    /// Commitment the retrieved blob must match, if this variant carries one.
    pub fn expected_commitment(&self) -> Option<&Commitment> {
        match self {
            Reference::Frame(f) => Some(&f.commitment),
            Reference::Blob(_)  => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Reference::Frame(f) => f.encode().to_vec(),
            Reference::Blob(b)  => b.encode().to_vec(),
        }
    }
}
