//! C ABI: one JSON request in, one JSON response out.
//!
//! Responses are allocated here and must be handed back to
//! `tabproxy_bytes_free`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use tabproxy_core::{policy, HostError, ProxyManager, ProxyRegistry, Response};
use tracing::error;

#[repr(C)]
#[derive(Copy, Clone)]
pub struct tp_bytes {
    pub ptr: *mut u8,
    pub len: u32,
}

impl tp_bytes {
    const EMPTY: tp_bytes = tp_bytes {
        ptr: std::ptr::null_mut(),
        len: 0,
    };
}

static MANAGER: OnceLock<ProxyManager> = OnceLock::new();

/// Process-wide manager behind the C ABI.
pub fn global_manager() -> &'static ProxyManager {
    MANAGER.get_or_init(|| crate::new_manager(ProxyRegistry::global()))
}

unsafe fn bytes_as_slice<'a>(b: tp_bytes) -> &'a [u8] {
    if b.ptr.is_null() || b.len == 0 {
        return &[];
    }
    core::slice::from_raw_parts(b.ptr as *const u8, b.len as usize)
}

fn into_bytes(out: Vec<u8>) -> tp_bytes {
    into_bytes_within(out, u32::MAX as usize)
}

/// A response longer than `limit` is replaced by an internal error response.
fn into_bytes_within(out: Vec<u8>, limit: usize) -> tp_bytes {
    let out = if out.len() > limit {
        error!(len = out.len(), limit, "response too large for the C ABI");
        Response::Err {
            error: HostError::internal(format!(
                "response is {} bytes, more than the C ABI can carry ({limit})",
                out.len()
            )),
        }
        .encode()
    } else {
        out
    };
    let Ok(len) = u32::try_from(out.len()) else {
        return tp_bytes::EMPTY;
    };
    let boxed = out.into_boxed_slice();
    tp_bytes {
        ptr: Box::into_raw(boxed) as *mut u8,
        len,
    }
}

#[no_mangle]
pub unsafe extern "C" fn tabproxy_call_v1(req: tp_bytes) -> tp_bytes {
    let out = catch_unwind(AssertUnwindSafe(|| {
        let request = bytes_as_slice(req);
        global_manager().handle_json(request, policy().max_request_bytes)
    }));
    match out {
        Ok(out) => into_bytes(out),
        Err(_) => {
            error!("panic while handling request");
            let resp = Response::Err {
                error: HostError::internal("native panic while handling request"),
            };
            into_bytes(resp.encode())
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn tabproxy_bytes_free(b: tp_bytes) {
    if b.ptr.is_null() {
        return;
    }
    let slice = core::ptr::slice_from_raw_parts_mut(b.ptr, b.len as usize);
    drop(Box::from_raw(slice));
}
