//! DA client: one contract over interchangeable backends.
//!
//! # Backends
//! [`DaBackend`] is the capability a backend provides: store a blob, fetch
//! one by transaction id, report health, release resources. Two ship with
//! the crate:
//!   - [`native::NativeClient`], a linked library behind a frozen C ABI.
//!   - [`sidecar::SidecarClient`], an HTTP sidecar service.
//!
//! The backend is chosen once, at construction. Nothing in [`DaClient`]
//! branches on which one it holds.
//!
//! # Lifecycle
//! ```text
//!   (constructor + handshake) ──► Ready ──close()──► Closed
//! ```
//! `submit`, `get` and `health` are only valid while `Ready`; afterwards they
//! fail with [`DaError::ClientClosed`]. `close()` is idempotent.
//!
//! # Concurrency
//! Every call blocks for one backend round-trip and returns one result.
//! There are no background threads, timeouts per call, or retries.
//! Backends are `Send + Sync`, so one client can serve several threads by
//! reference; native calls are still serialized process-wide.

pub mod native;
pub mod sidecar;

use tracing::{debug, info, warn};

use crate::blob::{commitment_of, Blob, Commitment, TxId};
use crate::commitment::{decode_da_commitment, encode_da_commitment};
use crate::config::{NativeConfig, SidecarConfig};
use crate::error::{DaError, Result};
use crate::namespace::Namespace;
use crate::reference::{BlobRef, FrameRef, Reference, ReferenceError, ReferenceKind, FRAME_REF_LEN};
use crate::router::{Route, SubmissionRouter, SENTINEL_CANDIDATE};

use self::native::{NativeClient, NativeDaBindings};
use self::sidecar::SidecarClient;

/// Backend answers of this length or shorter mean "no reference produced".
pub const MAX_NO_REFERENCE_LEN: usize = 1;

/// A blob as returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedBlob {
    pub data:       Vec<u8>,
    /// Commitment reported by the backend, when it reports one.
    pub commitment: Option<Commitment>,
}

/// Capability every DA backend implements.
pub trait DaBackend: Send + Sync {
    /// Store `blob` and return the backend's raw reference bytes.
    /// An empty (or single-byte) answer means no reference was produced.
    fn submit(&self, blob: &Blob) -> Result<Vec<u8>>;

    fn get(&self, tx_id: &TxId) -> Result<RetrievedBlob>;

    fn health(&self) -> Result<()> {
        Ok(())
    }

    /// Release backend resources. Called at most once.
    fn close(&mut self) {}

    /// Short backend label for logs.
    fn name(&self) -> &'static str;
}

/// What `submit` hands back.
///
/// Raw data and references are both byte strings on the wire; keeping them
/// apart here stops a pass-through payload from being decoded as a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Data is on the DA layer; carry this reference instead of the data.
    Reference(Reference),
    /// Data was not submitted (or no reference came back); here it is again.
    PassThrough(Vec<u8>),
}

impl SubmitOutcome {
    pub fn is_reference(&self) -> bool {
        matches!(self, SubmitOutcome::Reference(_))
    }

    pub fn reference(&self) -> Option<&Reference> {
        match self {
            SubmitOutcome::Reference(r)   => Some(r),
            SubmitOutcome::PassThrough(_) => None,
        }
    }

    /// Flatten to the byte form callers put on chain.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            SubmitOutcome::Reference(r)      => r.encode(),
            SubmitOutcome::PassThrough(data) => data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Ready,
    Closed,
}

pub struct DaClient {
    backend:   Box<dyn DaBackend>,
    namespace: Namespace,
    kind:      ReferenceKind,
    router:    SubmissionRouter,
    state:     ClientState,
}

impl std::fmt::Debug for DaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaClient")
            .field("backend", &self.backend.name())
            .field("namespace", &self.namespace)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish()
    }
}

impl DaClient {
    /// Client over a linked native library.
    pub fn native(bindings: &'static NativeDaBindings, config: &NativeConfig) -> Result<Self> {
        let backend = NativeClient::new(bindings, config)?;
        Ok(Self::with_backend(Box::new(backend), config.namespace, config.reference_kind))
    }

    /// Client over an HTTP sidecar. Fails unless the sidecar is healthy and,
    /// when the config carries one, accepts the configure request.
    pub fn sidecar(config: &SidecarConfig) -> Result<Self> {
        let backend = SidecarClient::connect(config)?;
        Ok(Self::with_backend(Box::new(backend), config.namespace(), config.reference_kind))
    }

    pub fn with_backend(backend: Box<dyn DaBackend>, namespace: Namespace, kind: ReferenceKind) -> Self {
        info!(backend = backend.name(), %namespace, %kind, "DA client ready");
        Self {
            backend,
            namespace,
            kind,
            router: SubmissionRouter::default(),
            state: ClientState::Ready,
        }
    }

    pub fn with_router(mut self, router: SubmissionRouter) -> Self {
        self.router = router;
        self
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn reference_kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            ClientState::Ready  => Ok(()),
            ClientState::Closed => Err(DaError::ClientClosed),
        }
    }

    // ── Submission ───────────────────────────────────────────────────────────

    /// Route `data` by `candidate_hex` and, if it is ours, publish it.
    pub fn submit(&self, candidate_hex: &str, data: &[u8]) -> Result<SubmitOutcome> {
        self.ensure_ready()?;

        match self.router.route(candidate_hex) {
            Route::ForceSubmit => self.submit_routed(candidate_hex, data),
            Route::PassThrough => {
                debug!(candidate = candidate_hex, len = data.len(), "candidate is not the DA sentinel, passing data through");
                Ok(SubmitOutcome::PassThrough(data.to_vec()))
            }
        }
    }

    /// Publish `data` whatever the router's sentinel is.
    pub fn force_submit(&self, data: &[u8]) -> Result<SubmitOutcome> {
        self.ensure_ready()?;
        self.submit_routed(SENTINEL_CANDIDATE, data)
    }

    fn submit_routed(&self, candidate_hex: &str, data: &[u8]) -> Result<SubmitOutcome> {
        let blob = Blob::from(data);
        let raw = self.backend.submit(&blob)?;
        info!(
            backend = self.backend.name(),
            candidate = candidate_hex,
            namespace = %self.namespace,
            len = data.len(),
            ref_len = raw.len(),
            "submitted blob"
        );

        if raw.len() <= MAX_NO_REFERENCE_LEN {
            warn!(ref_len = raw.len(), "no reference returned from DA backend, falling back to raw data");
            return Ok(SubmitOutcome::PassThrough(data.to_vec()));
        }

        let reference = self.reference_from_backend(&raw, &blob)?;
        debug!(reference = %hex::encode(reference.encode()), "reference");
        Ok(SubmitOutcome::Reference(reference))
    }

    fn reference_from_backend(&self, raw: &[u8], blob: &Blob) -> Result<Reference, ReferenceError> {
        match self.kind {
            ReferenceKind::Frame if raw.len() >= FRAME_REF_LEN => FrameRef::decode(raw).map(Reference::Frame),
            // A bare tx id: complete the frame with the commitment of what we sent.
            ReferenceKind::Frame => BlobRef::decode(raw)
                .map(|b| Reference::Frame(FrameRef::new(b.tx_id, blob.commitment()))),
            ReferenceKind::Blob if raw.len() >= FRAME_REF_LEN => FrameRef::decode(raw)
                .map(|f| Reference::Blob(BlobRef::from(f))),
            ReferenceKind::Blob => BlobRef::decode(raw).map(Reference::Blob),
        }
    }

    // ── Retrieval ────────────────────────────────────────────────────────────

    /// Fetch the blob behind `reference`. `index` is the caller's position
    /// of the reference in its batch and is only logged.
    ///
    /// For frame references the blob's commitment must equal the one in the
    /// reference, otherwise nothing is returned.
    pub fn get(&self, reference: &[u8], index: u32) -> Result<Vec<u8>> {
        self.ensure_ready()?;

        let reference = self.kind.decode(reference).map_err(|e| {
            warn!(index, error = %e, "unable to decode reference");
            e
        })?;
        info!(index, tx_id = %hex::encode(reference.tx_id()), namespace = %self.namespace, "reference request");

        let retrieved = self.backend.get(reference.tx_id())?;

        if let Some(expected) = reference.expected_commitment() {
            let actual = retrieved.commitment.unwrap_or_else(|| commitment_of(&retrieved.data));
            if &actual != expected {
                warn!(index, tx_id = %hex::encode(reference.tx_id()), "blob commitment mismatch");
                return Err(DaError::commitment_mismatch(expected, &actual));
            }
            debug!("blob commitments match");
        }
        Ok(retrieved.data)
    }

    // ── altDA ────────────────────────────────────────────────────────────────

    /// Publish `data` and return the altDA generic commitment naming it.
    ///
    /// There is no raw-data fallback here: a backend that produces no
    /// reference fails the call, so the result is always a commitment.
    pub fn submit_altda(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.force_submit(data)? {
            SubmitOutcome::Reference(r) => Ok(encode_da_commitment(&[BlobRef::new(*r.tx_id())])),
            SubmitOutcome::PassThrough(_) => Err(DaError::SubmissionFailed(
                "no reference returned from DA backend, cannot build altDA commitment".into(),
            )),
        }
    }

    /// Fetch and concatenate every blob an altDA commitment names.
    pub fn get_altda(&self, commitment: &[u8]) -> Result<Vec<u8>> {
        self.ensure_ready()?;
        let refs = decode_da_commitment(commitment)?;
        let mut data = Vec::new();
        for r in &refs {
            data.extend_from_slice(&self.backend.get(&r.tx_id)?.data);
        }
        Ok(data)
    }

    // ── Health / lifecycle ───────────────────────────────────────────────────

    pub fn health(&self) -> Result<()> {
        self.ensure_ready()?;
        self.backend.health()
    }

    pub fn close(&mut self) {
        if self.state == ClientState::Ready {
            self.backend.close();
            self.state = ClientState::Closed;
            info!(backend = self.backend.name(), "DA client closed");
        }
    }
}
