//! Blobs and their content commitment.
//!
//! A blob's commitment is the BLAKE3 Merkle root over fixed 256-byte chunks
//! of its data:
//!
//! ```text
//!   leaf   = BLAKE3(chunk)
//!   parent = BLAKE3(left ‖ right)      odd node at a level is promoted as-is
//!   empty  = BLAKE3("")
//! ```
//!
//! The root is what a legacy frame reference carries in its second half.

use serde::{Deserialize, Serialize};

/// Identity of the transaction that stored a blob.
pub type TxId = [u8; 32];
/// 32-byte content commitment of a blob.
pub type Commitment = [u8; 32];

pub const TX_ID_LEN:      usize = 32;
pub const COMMITMENT_LEN: usize = 32;
/// Leaf size of the commitment Merkle tree.
pub const COMMITMENT_CHUNK_SIZE: usize = 256;

/// Opaque data published to the DA layer. Never persisted by this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn commitment(&self) -> Commitment {
        commitment_of(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self {
        Self { data: data.to_vec() }
    }
}

/// Merkle root of `data` as described in the module docs.
pub fn commitment_of(data: &[u8]) -> Commitment {
    if data.is_empty() {
        return blake3::hash(b"").into();
    }
    let mut level: Vec<[u8; 32]> = data
        .chunks(COMMITMENT_CHUNK_SIZE)
        .map(|chunk| blake3::hash(chunk).into())
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    let mut hasher = blake3::Hasher::new();
                    hasher.update(left);
                    hasher.update(right);
                    hasher.finalize().into()
                }
                [odd] => *odd,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
    }
    level[0]
}
