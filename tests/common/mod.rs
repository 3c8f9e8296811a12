//! In-process native DA library backed by `MemoryBlobStore`, exposed through
//! the same C ABI a linked library would provide.

#![allow(dead_code)]

use std::ffi::{c_char, c_void, CStr};
use std::ptr;
use std::sync::Mutex;

use near_da_client::client::native::{rc, NativeDaBindings, NEAR_DA_ABI_VERSION};
use near_da_client::store::{BlobStore, MemoryBlobStore};
use near_da_client::{commitment_of, Blob, Namespace, TxId};

/// Accounts `new_client` refuses, as if they did not exist on chain.
pub const MISSING_ACCOUNT: &str = "missing.testnet";

static SLOT: Mutex<Option<String>> = Mutex::new(None);

struct MemoryClient {
    namespace: Namespace,
    store:     MemoryBlobStore,
}

fn set_error(msg: impl Into<String>) {
    *SLOT.lock().unwrap() = Some(msg.into());
}

/// Copy `src` into a host buffer, or report the size it needs.
unsafe fn write_out(src: &[u8], out: *mut u8, out_len: *mut usize) -> i32 {
    if *out_len < src.len() {
        *out_len = src.len();
        return rc::OVERFLOW;
    }
    ptr::copy_nonoverlapping(src.as_ptr(), out, src.len());
    *out_len = src.len();
    rc::OK
}

unsafe extern "C" fn new_client(
    account_id:        *const c_char,
    _secret_key:       *const c_char,
    _contract:         *const c_char,
    _network:          *const c_char,
    namespace_version: u8,
    namespace_id:      u32,
) -> *mut c_void {
    let account = CStr::from_ptr(account_id).to_string_lossy();
    if account == MISSING_ACCOUNT {
        set_error(format!("account {account} does not exist"));
        return ptr::null_mut();
    }
    let client = MemoryClient {
        namespace: Namespace::new(namespace_version, namespace_id),
        store:     MemoryBlobStore::new(),
    };
    Box::into_raw(Box::new(client)) as *mut c_void
}

unsafe extern "C" fn free_client(client: *mut c_void) {
    if !client.is_null() {
        drop(Box::from_raw(client as *mut MemoryClient));
    }
}

unsafe extern "C" fn submit(
    client:      *mut c_void,
    data:        *const u8,
    data_len:    usize,
    out_ref:     *mut u8,
    out_ref_len: *mut usize,
) -> i32 {
    let client = &*(client as *const MemoryClient);
    let data = if data_len == 0 { &[][..] } else { std::slice::from_raw_parts(data, data_len) };
    let commitment = commitment_of(data);
    match client.store.store(client.namespace, Blob::from(data)) {
        Ok(tx_id) => {
            let mut reference = Vec::with_capacity(64);
            reference.extend_from_slice(&tx_id);
            reference.extend_from_slice(&commitment);
            write_out(&reference, out_ref, out_ref_len)
        }
        Err(e) => {
            set_error(e.to_string());
            rc::FAILED
        }
    }
}

unsafe extern "C" fn get(
    client:         *mut c_void,
    tx_id:          *const u8,
    out_data:       *mut u8,
    out_data_len:   *mut usize,
    out_commitment: *mut u8,
) -> i32 {
    let client = &*(client as *const MemoryClient);
    let mut id: TxId = [0u8; 32];
    ptr::copy_nonoverlapping(tx_id, id.as_mut_ptr(), id.len());

    match client.store.load(&id) {
        Ok(Some(blob)) => {
            let code = write_out(&blob.data, out_data, out_data_len);
            if code == rc::OK {
                ptr::copy_nonoverlapping(blob.commitment().as_ptr(), out_commitment, 32);
            }
            code
        }
        // Soft failure: OK with nothing written, reason in the slot.
        Ok(None) => {
            *out_data_len = 0;
            set_error("no data found for transaction");
            rc::OK
        }
        Err(e) => {
            set_error(e.to_string());
            rc::FAILED
        }
    }
}

unsafe extern "C" fn get_error(out_msg: *mut u8, out_len: *mut usize) -> i32 {
    match SLOT.lock().unwrap().as_deref() {
        None => {
            *out_len = 0;
            rc::OK
        }
        Some(msg) => write_out(msg.as_bytes(), out_msg, out_len),
    }
}

unsafe extern "C" fn clear_error() {
    *SLOT.lock().unwrap() = None;
}

pub static MEMORY_BINDINGS: NativeDaBindings = NativeDaBindings {
    abi_version: NEAR_DA_ABI_VERSION,
    new_client:  Some(new_client),
    free_client: Some(free_client),
    submit:      Some(submit),
    get:         Some(get),
    get_error:   Some(get_error),
    clear_error: Some(clear_error),
};
