//! altDA (plasma) commitment wire format.
//!
//! ```text
//!   [ type: 1 B ][ payload: N B ]
//!   type 0  keccak commitment  (not reconstructable here)
//!   type 1  generic commitment (payload is opaque)
//! ```
//!
//! [`decode_commitment`] is total and never fails: anything that is not a
//! generic commitment decodes to `None`, which callers treat as "not ours".
//!
//! The NEAR generic payload is itself `[ 0x6e ][ tx_id ]*`, a DA-layer
//! selector followed by one or more 32-byte transaction ids. Its codec
//! ([`encode_da_commitment`] / [`decode_da_commitment`]) is strict.

use thiserror::Error;

use crate::blob::TX_ID_LEN;
use crate::reference::BlobRef;

/// DA-layer selector byte for NEAR inside a generic commitment.
pub const DA_SELECTOR: u8 = 0x6e;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommitmentType {
    Keccak  = 0,
    Generic = 1,
}

impl CommitmentType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(CommitmentType::Keccak),
            1 => Some(CommitmentType::Generic),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("invalid commitment: not a generic commitment")]
    NotGeneric,
    #[error("invalid DA selector {found:#04x}, expected {:#04x}", DA_SELECTOR)]
    InvalidSelector { found: u8 },
    #[error("invalid commitment: payload of {len} bytes is not a non-empty multiple of {}", TX_ID_LEN)]
    InvalidLength { len: usize },
}

/// Prefix `payload` with the generic commitment type byte.
pub fn encode_commitment(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(CommitmentType::Generic as u8);
    out.extend_from_slice(payload);
    out
}

/// Payload of a generic commitment; `None` for anything else.
pub fn decode_commitment(bytes: &[u8]) -> Option<&[u8]> {
    let (&ty, payload) = bytes.split_first()?;
    match CommitmentType::from_byte(ty) {
        Some(CommitmentType::Generic) => Some(payload),
        Some(CommitmentType::Keccak) | None => None,
    }
}

/// Build `[ 0x01 ][ 0x6e ][ tx_id ]*` from compact references.
pub fn encode_da_commitment(refs: &[BlobRef]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + refs.len() * TX_ID_LEN);
    payload.push(DA_SELECTOR);
    for r in refs {
        payload.extend_from_slice(&r.encode());
    }
    encode_commitment(&payload)
}

/// Inverse of [`encode_da_commitment`]. Fails on any malformed input.
pub fn decode_da_commitment(bytes: &[u8]) -> Result<Vec<BlobRef>, CommitmentError> {
    let payload = decode_commitment(bytes).ok_or(CommitmentError::NotGeneric)?;
    let (&selector, ids) = payload
        .split_first()
        .ok_or(CommitmentError::InvalidLength { len: 0 })?;
    if selector != DA_SELECTOR {
        return Err(CommitmentError::InvalidSelector { found: selector });
    }
    if ids.is_empty() || ids.len() % TX_ID_LEN != 0 {
        return Err(CommitmentError::InvalidLength { len: ids.len() });
    }
    Ok(ids
        .chunks_exact(TX_ID_LEN)
        .map(|chunk| {
            let mut tx_id = [0u8; TX_ID_LEN];
            tx_id.copy_from_slice(chunk);
            BlobRef::new(tx_id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_is_total() {
        assert_eq!(decode_commitment(&[]), None);
        assert_eq!(decode_commitment(&[0, 1, 2, 3]), None);
        assert_eq!(decode_commitment(&[1, 1, 2, 3]), Some(&[1u8, 2, 3][..]));
        assert_eq!(decode_commitment(&[1]), Some(&[][..]));
        assert_eq!(decode_commitment(&[255, 1, 2]), None);
        assert_eq!(decode_commitment(&[2]), None);
    }

    #[test]
    fn encode_prepends_generic_type() {
        assert_eq!(encode_commitment(&[1, 2, 3]), vec![1, 1, 2, 3]);
        assert_eq!(encode_commitment(&[]), vec![1]);
    }

    #[test]
    fn da_commitment_layout() {
        let refs = [BlobRef::new([0xAA; 32]), BlobRef::new([0xBB; 32])];
        let bytes = encode_da_commitment(&refs);
        assert_eq!(bytes.len(), 2 + 64);
        assert_eq!(&bytes[..2], &[1, DA_SELECTOR]);
        assert_eq!(decode_da_commitment(&bytes).unwrap(), refs.to_vec());
    }

    #[test]
    fn da_commitment_rejects_keccak_type() {
        let mut bytes = encode_da_commitment(&[BlobRef::new([1; 32])]);
        bytes[0] = 0;
        assert_eq!(decode_da_commitment(&bytes), Err(CommitmentError::NotGeneric));
    }

    #[test]
    fn da_commitment_rejects_wrong_selector() {
        let mut bytes = encode_da_commitment(&[BlobRef::new([1; 32])]);
        bytes[1] = 0;
        assert_eq!(decode_da_commitment(&bytes), Err(CommitmentError::InvalidSelector { found: 0 }));
    }

    #[test]
    fn da_commitment_rejects_partial_ids() {
        let mut bytes = encode_da_commitment(&[BlobRef::new([1; 32])]);
        bytes.pop();
        assert_eq!(decode_da_commitment(&bytes), Err(CommitmentError::InvalidLength { len: 31 }));
        assert_eq!(
            decode_da_commitment(&[1, DA_SELECTOR]),
            Err(CommitmentError::InvalidLength { len: 0 })
        );
        assert_eq!(decode_da_commitment(&[1]), Err(CommitmentError::InvalidLength { len: 0 }));
    }

    proptest! {
        #[test]
        fn generic_inverse(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode_commitment(&payload);
            prop_assert_eq!(decode_commitment(&encoded), Some(payload.as_slice()));
        }

        #[test]
        fn non_generic_types_decode_to_none(ty in 2u8..=255, rest in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut bytes = vec![ty];
            bytes.extend_from_slice(&rest);
            prop_assert_eq!(decode_commitment(&bytes), None);
        }
    }
}
