//! Panel-scoped exports, served from the optional host functions found next to
//! the main entry point.
//!
//! All three return `-2` for a null buffer, `capacity <= 0` or a panel id
//! outside `0..256`, and `-1` plus a diagnostic document when the host
//! function is not present.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};

use t3bridge_core::target::PanelExport;

use crate::bridge::host_bridge;
use crate::forwarder::write_panel_exception;
use crate::macros::abi_fn;

abi_fn! {
    fn T3Bridge_GetDeviceBasicSettings(panel_id: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
        host_bridge()
            .forwarder()
            .invoke_panel(PanelExport::BasicSettings, panel_id, buffer, capacity)
    }
    recover => unsafe { write_panel_exception(PanelExport::BasicSettings, panel_id, buffer, capacity) }
}

abi_fn! {
    fn T3Bridge_GetDeviceNetworkConfig(panel_id: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
        host_bridge()
            .forwarder()
            .invoke_panel(PanelExport::NetworkConfig, panel_id, buffer, capacity)
    }
    recover => unsafe { write_panel_exception(PanelExport::NetworkConfig, panel_id, buffer, capacity) }
}

abi_fn! {
    fn T3Bridge_GetTrendlogList(panel_id: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
        host_bridge()
            .forwarder()
            .invoke_panel(PanelExport::TrendlogList, panel_id, buffer, capacity)
    }
    recover => unsafe { write_panel_exception(PanelExport::TrendlogList, panel_id, buffer, capacity) }
}
