pub mod namespace;
pub mod blob;
pub mod reference;
pub mod commitment;
pub mod router;
pub mod config;
pub mod error;
pub mod store;
pub mod client;

pub use namespace::Namespace;
pub use blob::{Blob, Commitment, TxId, commitment_of};
pub use reference::{BlobRef, FrameRef, Reference, ReferenceError, ReferenceKind};
pub use commitment::{decode_commitment, encode_commitment};
pub use router::{Route, SubmissionRouter, SENTINEL_CANDIDATE};
pub use config::{ConfigureRequest, Network, NativeConfig, SidecarConfig};
pub use error::DaError;
pub use store::{BlobStore, MemoryBlobStore};
pub use client::{DaBackend, DaClient, SubmitOutcome};
