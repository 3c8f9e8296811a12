//! Native DA backend behind a frozen C ABI.
//!
//! The native library hands the host one static descriptor,
//! [`NativeDaBindings`], typically returned by a registration symbol:
//!
//! ```c
//! const NearDaBindings *near_da_register(void);
//! ```
//!
//! The descriptor is **static**; the host never frees it.
//!
//! # Stability contract
//! - `NEAR_DA_ABI_VERSION` only ever increases.
//! - New fields are appended at the end of `NativeDaBindings` only.
//! - A library built against ABI version N works with any host ≥ N.
//!
//! # Error slot
//! The library keeps a single process-wide "last error" slot. Failures,
//! including soft ones such as "no data found" that still return `rc::OK`,
//! are reported *only* through that slot. The host therefore reads and clears
//! it after every call, and holds one process-wide lock from the call until
//! the slot has been cleared. At most one native call is in flight per
//! process.
//!
//! # Memory model
//! The library never allocates on behalf of the host. Every output buffer is
//! host-owned and passed with its capacity in `*out_len`; on return
//! `*out_len` holds the bytes written, or the required size together with
//! `rc::OVERFLOW`.

use std::ffi::{c_char, c_void, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{DaBackend, RetrievedBlob};
use crate::blob::{Blob, TxId, COMMITMENT_LEN};
use crate::config::NativeConfig;
use crate::error::{DaError, Result};
use crate::reference::FRAME_REF_LEN;

/// ABI version of this descriptor. Written into `NativeDaBindings::abi_version`.
pub const NEAR_DA_ABI_VERSION: u32 = 1;

/// First capacity offered for a submitted reference.
pub const INITIAL_REF_CAPACITY: usize = FRAME_REF_LEN;

/// Largest reference, padding included, the host accepts.
pub const MAX_REF_LEN: usize = 4 * 1024;

/// First guess for a retrieved blob's size; `get` is repeated once with the
/// exact size on overflow.
pub const INITIAL_BLOB_CAPACITY: usize = 128 * 1024;

/// Largest blob the host will allocate for on a library's say-so.
pub const MAX_BLOB_LEN: usize = 64 * 1024 * 1024;

const INITIAL_ERROR_CAPACITY: usize = 256;

/// Return codes from native entry points.
pub mod rc {
    /// Success. Check the error slot anyway.
    pub const OK:       i32 = 0;
    /// Output buffer too small; `*out_len` holds the required size.
    pub const OVERFLOW: i32 = -1;
    /// Hard failure; details are in the error slot.
    pub const FAILED:   i32 = -2;
}

/// Frozen C ABI descriptor of a native DA library.
///
/// `#[repr(C)]` is mandatory. Do not reorder fields.
#[repr(C)]
pub struct NativeDaBindings {
    /// Must not exceed `NEAR_DA_ABI_VERSION`.
    pub abi_version: u32,

    /// Create a client bound to an account, contract and network. All strings
    /// are NUL-terminated UTF-8. Returns null on failure.
    pub new_client: Option<unsafe extern "C" fn(
        account_id:        *const c_char,
        secret_key:        *const c_char,
        contract:          *const c_char,
        network:           *const c_char,
        namespace_version: u8,
        namespace_id:      u32,
    ) -> *mut c_void>,

    /// Release a client. The handle is dangling afterwards.
    pub free_client: Option<unsafe extern "C" fn(client: *mut c_void)>,

    /// Store `data[0..data_len]`, write the reference to `out_ref`.
    /// A reference of length 0 or 1 means "no reference produced".
    /// `rc::OVERFLOW` must be returned before anything is stored: the host
    /// repeats the call once with the reported capacity.
    pub submit: Option<unsafe extern "C" fn(
        client:      *mut c_void,
        data:        *const u8,
        data_len:    usize,
        out_ref:     *mut u8,
        out_ref_len: *mut usize,
    ) -> i32>,

    /// Fetch the blob stored by transaction `tx_id[0..32]` and its 32-byte
    /// commitment.
    pub get: Option<unsafe extern "C" fn(
        client:         *mut c_void,
        tx_id:          *const u8,
        out_data:       *mut u8,
        out_data_len:   *mut usize,
        out_commitment: *mut u8,
    ) -> i32>,

    /// Copy the last error message (UTF-8, no terminator) without clearing
    /// it. `*out_len == 0` on return means the slot is empty.
    pub get_error: Option<unsafe extern "C" fn(out_msg: *mut u8, out_len: *mut usize) -> i32>,

    /// Empty the error slot.
    pub clear_error: Option<unsafe extern "C" fn()>,
}

// Safety: the ABI contract declares all entry points callable from any
// thread as long as calls are serialized, which `native_call_lock` ensures.
unsafe impl Send for NativeDaBindings {}
unsafe impl Sync for NativeDaBindings {}

static NATIVE_CALL_LOCK: Mutex<()> = Mutex::new(());

/// Serializes native calls together with the error-slot read that follows.
pub(crate) fn native_call_lock() -> MutexGuard<'static, ()> {
    NATIVE_CALL_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Error channel ───────────────────────────────────────────────────────────

/// Host-side view of the library's process-wide error slot.
///
/// Only read while holding [`native_call_lock`].
#[derive(Clone, Copy)]
pub struct ErrorChannel {
    bindings: &'static NativeDaBindings,
}

impl ErrorChannel {
    pub fn new(bindings: &'static NativeDaBindings) -> Self {
        Self { bindings }
    }

    /// Take the pending error, if any, and leave the slot empty.
    ///
    /// A panic while reading is reported as an error message rather than
    /// propagated.
    pub fn peek_and_clear(&self) -> Option<String> {
        let read = catch_unwind(AssertUnwindSafe(|| self.read_slot()));
        if let Some(clear) = self.bindings.clear_error {
            unsafe { clear() };
        }
        match read {
            Ok(msg) => msg,
            Err(panic) => Some(format!(
                "critical error reading native DA error slot: {}",
                panic_message(panic.as_ref())
            )),
        }
    }

    fn read_slot(&self) -> Option<String> {
        let get_error = self.bindings.get_error?;
        let mut buf = vec![0u8; INITIAL_ERROR_CAPACITY];
        let mut len = buf.len();
        let mut code = unsafe { get_error(buf.as_mut_ptr(), &mut len) };
        if code == rc::OVERFLOW {
            buf.resize(len, 0);
            len = buf.len();
            code = unsafe { get_error(buf.as_mut_ptr(), &mut len) };
        }
        if code != rc::OK {
            return Some(format!("native DA error slot unreadable (code {code})"));
        }
        if len == 0 {
            return None;
        }
        buf.truncate(len.min(buf.len()));
        Some(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Safe wrapper around one native client handle.
pub struct NativeClient {
    bindings: &'static NativeDaBindings,
    errors:   ErrorChannel,
    /// Null once released.
    handle:   *mut c_void,
}

// Safety: the handle is only dereferenced by the library, under
// `native_call_lock`, and is owned exclusively by this wrapper. Release
// needs `&mut self`.
unsafe impl Send for NativeClient {}
unsafe impl Sync for NativeClient {}

impl NativeClient {
    pub fn new(bindings: &'static NativeDaBindings, config: &NativeConfig) -> Result<Self> {
        if bindings.abi_version > NEAR_DA_ABI_VERSION {
            return Err(DaError::Initialization(format!(
                "native DA ABI version {} is newer than host ABI version {}",
                bindings.abi_version, NEAR_DA_ABI_VERSION,
            )));
        }
        let network = config.network()?;
        let new_client = bindings
            .new_client
            .ok_or_else(|| DaError::Initialization("native library missing new_client".into()))?;

        let account_id = c_string(&config.account_id)?;
        let secret_key = c_string(&config.secret_key)?;
        let contract   = c_string(&config.contract)?;
        let network_c  = c_string(network.name())?;

        debug!(
            contract = %config.contract,
            %network,
            namespace = %config.namespace,
            account = %config.account_id,
            "creating native DA client"
        );

        let errors = ErrorChannel::new(bindings);
        let _guard = native_call_lock();
        let handle = unsafe {
            new_client(
                account_id.as_ptr(),
                secret_key.as_ptr(),
                contract.as_ptr(),
                network_c.as_ptr(),
                config.namespace.version,
                config.namespace.id,
            )
        };
        let error = errors.peek_and_clear();

        match (handle.is_null(), error) {
            (true, error) => Err(DaError::Initialization(
                error.unwrap_or_else(|| "unable to create NEAR DA client".into()),
            )),
            (false, Some(error)) => {
                if let Some(free) = bindings.free_client {
                    unsafe { free(handle) };
                }
                Err(DaError::Initialization(error))
            }
            (false, None) => Ok(Self { bindings, errors, handle }),
        }
    }

    fn handle(&self) -> Result<*mut c_void> {
        if self.handle.is_null() {
            Err(DaError::ClientClosed)
        } else {
            Ok(self.handle)
        }
    }
}

impl DaBackend for NativeClient {
    fn submit(&self, blob: &Blob) -> Result<Vec<u8>> {
        let handle = self.handle()?;
        let submit = self
            .bindings
            .submit
            .ok_or_else(|| DaError::SubmissionFailed("native library missing submit".into()))?;

        let mut out = vec![0u8; INITIAL_REF_CAPACITY];
        let mut len = out.len();
        let _guard = native_call_lock();
        let mut code = unsafe { submit(handle, blob.data.as_ptr(), blob.data.len(), out.as_mut_ptr(), &mut len) };
        if code == rc::OVERFLOW {
            if let Some(error) = self.errors.peek_and_clear() {
                return Err(DaError::SubmissionFailed(format!("NEAR DA client {error}")));
            }
            grow(&mut out, len, MAX_REF_LEN).map_err(DaError::SubmissionFailed)?;
            len = out.len();
            code = unsafe { submit(handle, blob.data.as_ptr(), blob.data.len(), out.as_mut_ptr(), &mut len) };
        }

        if let Some(error) = self.errors.peek_and_clear() {
            return Err(DaError::SubmissionFailed(format!("NEAR DA client {error}")));
        }
        match code {
            rc::OK => {
                out.truncate(len.min(out.len()));
                Ok(out)
            }
            rc::OVERFLOW => Err(DaError::SubmissionFailed(format!(
                "native reference still does not fit after resize ({len} bytes)"
            ))),
            code => Err(DaError::SubmissionFailed(format!("native submit returned error code {code}"))),
        }
    }

    fn get(&self, tx_id: &TxId) -> Result<RetrievedBlob> {
        let handle = self.handle()?;
        let get = self
            .bindings
            .get
            .ok_or_else(|| DaError::RetrievalFailed("native library missing get".into()))?;

        let mut data = vec![0u8; INITIAL_BLOB_CAPACITY];
        let mut commitment = [0u8; COMMITMENT_LEN];
        let mut len = data.len();

        let _guard = native_call_lock();
        let mut code = unsafe { get(handle, tx_id.as_ptr(), data.as_mut_ptr(), &mut len, commitment.as_mut_ptr()) };
        if code == rc::OVERFLOW {
            if let Some(error) = self.errors.peek_and_clear() {
                return Err(DaError::RetrievalFailed(format!("NEAR DA client {error}")));
            }
            grow(&mut data, len, MAX_BLOB_LEN).map_err(DaError::RetrievalFailed)?;
            len = data.len();
            code = unsafe { get(handle, tx_id.as_ptr(), data.as_mut_ptr(), &mut len, commitment.as_mut_ptr()) };
        }

        if let Some(error) = self.errors.peek_and_clear() {
            warn!(tx_id = %hex::encode(tx_id), %error, "no data returned from native DA backend");
            return Err(DaError::RetrievalFailed(format!("NEAR DA client {error}")));
        }
        if code != rc::OK {
            return Err(DaError::RetrievalFailed(format!("native get returned error code {code}")));
        }
        data.truncate(len.min(data.len()));
        Ok(RetrievedBlob { data, commitment: Some(commitment) })
    }

    fn health(&self) -> Result<()> {
        self.handle().map(|_| ())
    }

    fn close(&mut self) {
        if self.handle.is_null() {
            return;
        }
        if let Some(free) = self.bindings.free_client {
            let _guard = native_call_lock();
            unsafe { free(self.handle) };
        }
        self.handle = ptr::null_mut();
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

impl Drop for NativeClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resize `buf` to a library-reported size, refusing sizes above `limit`.
fn grow(buf: &mut Vec<u8>, len: usize, limit: usize) -> std::result::Result<(), String> {
    if len > limit {
        return Err(format!("native library asked for {len} bytes, limit is {limit}"));
    }
    buf.resize(len, 0);
    Ok(())
}

fn c_string(s: &str) -> Result<CString> {
    CString::new(s).map_err(|e| DaError::Initialization(format!("argument contains NUL byte: {e}")))
}
