//! Shared object that plays the T3000 controls module in loader tests.
//!
//! Exports `T3000_HandleWebViewMsgBridge` and `GetDeviceBasicSettings` with
//! the host's calling conventions. Replies are tagged so a test can tell
//! which module served them.

#![allow(clippy::missing_safety_doc)]

use std::ffi::{CStr, c_char, c_int};

/// Copy `text` plus a NUL into `output`, or fail without writing.
unsafe fn reply(output: *mut c_char, capacity: c_int, text: &str) -> c_int {
    let Ok(capacity) = usize::try_from(capacity) else {
        return -2;
    };
    if output.is_null() || text.len() >= capacity {
        return -1;
    }
    // SAFETY: the caller owns `capacity` writable bytes at `output`.
    let out = unsafe { std::slice::from_raw_parts_mut(output.cast::<u8>(), capacity) };
    out[..text.len()].copy_from_slice(text.as_bytes());
    out[text.len()] = 0;
    0
}

/// Echoes the request: `{"fixture":"<input>","source":N}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn T3000_HandleWebViewMsgBridge(
    input: *const c_char,
    output: *mut c_char,
    output_len: c_int,
    source: c_int,
) -> c_int {
    if input.is_null() {
        return -2;
    }
    // Input and output alias when called in place.
    let request = unsafe { CStr::from_ptr(input) }.to_string_lossy().into_owned();
    let text = format!(r#"{{"fixture":"{request}","source":{source}}}"#);
    unsafe { reply(output, output_len, &text) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn GetDeviceBasicSettings(
    panel_id: c_int,
    buffer: *mut c_char,
    buffer_size: c_int,
) -> c_int {
    unsafe { reply(buffer, buffer_size, &format!(r#"{{"panel":{panel_id}}}"#)) }
}
