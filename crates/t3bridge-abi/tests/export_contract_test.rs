//! The exported C entry points as a host sees them, in a process where no
//! T3000 implementation is loaded.

use std::collections::HashSet;
use std::ffi::{CStr, c_int};
use std::ptr;
use std::sync::Mutex;

use t3bridge_abi::bridge_abi::{
    T3Bridge_ForceResolveAndReport, T3Bridge_HandleWebViewMsg, T3Bridge_Initialize,
    T3Bridge_IsTargetAvailable, T3Bridge_ResolutionReport, own_entry_points,
};
use t3bridge_abi::panel_abi::{T3Bridge_GetDeviceNetworkConfig, T3Bridge_GetTrendlogList};
use t3bridge_abi::host_bridge;

static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Keep the trail out of the build directory. Must run before the bridge is
/// first touched, which every test here does under the lock.
fn quiet() -> std::sync::MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: serialized by TEST_LOCK; no other thread reads the environment.
    unsafe { std::env::set_var("T3BRIDGE_TRAIL", "off") };
    guard
}

fn c_json(buf: &[u8]) -> serde_json::Value {
    let text = CStr::from_bytes_until_nul(buf).unwrap().to_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn null_buffer_is_invalid_argument() {
    let _guard = quiet();
    assert_eq!(unsafe { T3Bridge_HandleWebViewMsg(5, ptr::null_mut(), 10) }, -2);
}

#[test]
fn forwarding_without_host_returns_diagnostic() {
    let _guard = quiet();
    let mut buf = vec![0u8; 512];
    let rc = unsafe { T3Bridge_HandleWebViewMsg(7, buf.as_mut_ptr().cast(), 512) };
    assert_eq!(rc, -1);
    let doc = c_json(&buf);
    assert_eq!(doc["status"], "error");
    assert_eq!(doc["action"], 7);
    assert_eq!(doc["action_name"], "LOAD_GRAPHIC_ENTRY");
}

#[test]
fn lifecycle_exports_report_unavailable() {
    let _guard = quiet();
    assert_eq!(unsafe { T3Bridge_Initialize() }, 0);
    assert_eq!(unsafe { T3Bridge_IsTargetAvailable() }, 0);

    let before = host_bridge().cell().passes();
    assert_eq!(unsafe { T3Bridge_ForceResolveAndReport() }, 0);
    assert_eq!(host_bridge().cell().passes(), before + 1);
}

#[test]
fn resolution_report_is_json_snapshot() {
    let _guard = quiet();
    let _ = unsafe { T3Bridge_IsTargetAvailable() };

    let mut buf = vec![0u8; 2048];
    let rc = unsafe { T3Bridge_ResolutionReport(buf.as_mut_ptr().cast(), 2048) };
    assert_eq!(rc, 0);
    let report = c_json(&buf);
    assert_eq!(report["state"], "failed");
    assert!(report["passes"].as_u64().unwrap() >= 1);
    assert!(report["symbol"].is_null());
    assert_eq!(report["trail"]["mode"], "off");

    let mut tiny = [0xEEu8; 4];
    let rc = unsafe { T3Bridge_ResolutionReport(tiny.as_mut_ptr().cast(), 4) };
    assert_eq!(rc, -1);
    assert_eq!(tiny[0], 0);
    assert_eq!(unsafe { T3Bridge_ResolutionReport(ptr::null_mut(), 16) }, -2);
}

#[test]
fn panel_exports_validate_then_report_unavailable() {
    let _guard = quiet();
    let mut buf = [0xABu8; 256];
    let cap = buf.len() as c_int;

    let rc = unsafe { T3Bridge_GetTrendlogList(256, buf.as_mut_ptr().cast(), cap) };
    assert_eq!(rc, -2);
    assert_eq!(buf, [0xAB; 256]);

    let rc = unsafe { T3Bridge_GetDeviceNetworkConfig(1, buf.as_mut_ptr().cast(), cap) };
    assert_eq!(rc, -1);
    let doc = c_json(&buf);
    assert_eq!(doc["panel_id"], 1);
    assert_eq!(doc["export"], "GetDeviceNetworkConfig");
}

#[test]
fn own_entry_points_are_distinct() {
    let entries = own_entry_points();
    let unique: HashSet<_> = entries.iter().collect();
    assert_eq!(unique.len(), entries.len());
    assert!(entries.iter().all(|addr| *addr != 0));
}
