//! Lifecycle and forwarding exports.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};

use crate::bridge::host_bridge;
use crate::forwarder;
use crate::macros::abi_fn;
use crate::panel_abi::{
    T3Bridge_GetDeviceBasicSettings, T3Bridge_GetDeviceNetworkConfig, T3Bridge_GetTrendlogList,
};

/// Code addresses of every function this library exports. A probe that lands
/// on one of these would forward into ourselves.
#[must_use]
pub fn own_entry_points() -> [usize; 8] {
    [
        T3Bridge_Initialize as usize,
        T3Bridge_HandleWebViewMsg as usize,
        T3Bridge_ForceResolveAndReport as usize,
        T3Bridge_IsTargetAvailable as usize,
        T3Bridge_ResolutionReport as usize,
        T3Bridge_GetDeviceBasicSettings as usize,
        T3Bridge_GetDeviceNetworkConfig as usize,
        T3Bridge_GetTrendlogList as usize,
    ]
}

abi_fn! {
    /// Resolve now instead of on the first forwarded call. Returns `1` if a
    /// host entry point was found, `0` otherwise; never fails the host.
    fn T3Bridge_Initialize() -> c_int {
        c_int::from(host_bridge().initialize())
    }
    recover => 0
}

abi_fn! {
    /// Forward one WebView message to the host.
    ///
    /// `0`/callee code on success, `-1` when unavailable (diagnostic JSON in
    /// `buffer`), `-2` on a null buffer or `capacity <= 0`.
    fn T3Bridge_HandleWebViewMsg(action: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
        host_bridge().forwarder().invoke(action, buffer, capacity)
    }
    recover => unsafe { forwarder::write_exception(action, buffer, capacity) }
}

abi_fn! {
    /// Retry resolution if it failed earlier. `1` if a target is now resolved.
    fn T3Bridge_ForceResolveAndReport() -> c_int {
        c_int::from(host_bridge().forwarder().force().is_some())
    }
    recover => 0
}

abi_fn! {
    /// Resolve if needed and report availability as `1`/`0`.
    fn T3Bridge_IsTargetAvailable() -> c_int {
        c_int::from(host_bridge().forwarder().is_available())
    }
    recover => 0
}

abi_fn! {
    /// JSON snapshot of resolution state and trail health. Does not resolve.
    fn T3Bridge_ResolutionReport(buffer: *mut c_char, capacity: c_int) -> c_int {
        forwarder::write_report(&host_bridge().report(), buffer, capacity)
    }
    recover => unsafe { forwarder::write_exception(-1, buffer, capacity) }
}
