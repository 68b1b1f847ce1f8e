//! Resolution through the real dynamic loader.
//!
//! The fixture host library is mapped with `RTLD_GLOBAL` and named as the
//! controls module, so the main program's handle can also see its symbols.
//! The bridge must still attribute the entry point to the controls slot.

#![cfg(target_os = "linux")]

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::{CStr, c_int};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use libloading::os::unix::Library;
use t3bridge_abi::bridge_abi::{
    T3Bridge_ForceResolveAndReport, T3Bridge_HandleWebViewMsg, T3Bridge_IsTargetAvailable,
    T3Bridge_ResolutionReport,
};
use t3bridge_abi::client::ShimLibrary;
use t3bridge_abi::panel_abi::{T3Bridge_GetDeviceBasicSettings, T3Bridge_GetTrendlogList};
use t3bridge_core::target::PanelExport;

static TEST_LOCK: Mutex<()> = Mutex::new(());

struct HostFixture {
    path: PathBuf,
    _library: Library,
}

/// Cargo output directories next to this test executable.
fn target_dirs() -> Vec<PathBuf> {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap().to_path_buf();
    let profile = deps.parent().unwrap().to_path_buf();
    vec![deps, profile]
}

/// A cdylib built into the target directory, with or without a hash suffix.
fn built_library(stem: &str) -> PathBuf {
    let exact = format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}");
    let hashed = format!("{DLL_PREFIX}{stem}-");
    for dir in target_dirs() {
        let candidate = dir.join(&exact);
        if candidate.is_file() {
            return candidate;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&hashed) && name.ends_with(DLL_SUFFIX) {
                return entry.path();
            }
        }
    }
    panic!("{exact} was not built next to {:?}", target_dirs());
}

static FIXTURE: LazyLock<HostFixture> = LazyLock::new(|| {
    let path = built_library("t3bridge_fixture_host");
    // SAFETY: the fixture has no initializers.
    let library =
        unsafe { Library::open(Some(&path), libc::RTLD_NOW | libc::RTLD_GLOBAL) }.unwrap();
    // SAFETY: runs under TEST_LOCK before any bridge reads the environment.
    unsafe {
        std::env::set_var("T3BRIDGE_TRAIL", "off");
        std::env::set_var("T3BRIDGE_CONTROLS_MODULE", &path);
    }
    HostFixture {
        path,
        _library: library,
    }
});

fn with_fixture() -> (MutexGuard<'static, ()>, &'static Path) {
    let guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    (guard, FIXTURE.path.as_path())
}

fn c_text(buf: &[u8]) -> &str {
    CStr::from_bytes_until_nul(buf).unwrap().to_str().unwrap()
}

fn ping_buffer() -> Vec<u8> {
    let mut buf = vec![0u8; 256];
    buf[..5].copy_from_slice(b"ping\0");
    buf
}

#[test]
fn exports_resolve_fixture_as_controls_module() {
    let (_guard, fixture) = with_fixture();

    assert_eq!(unsafe { T3Bridge_ForceResolveAndReport() }, 1);
    assert_eq!(unsafe { T3Bridge_IsTargetAvailable() }, 1);

    let mut report = vec![0u8; 2048];
    let rc = unsafe { T3Bridge_ResolutionReport(report.as_mut_ptr().cast(), 2048) };
    assert_eq!(rc, 0);
    let report: serde_json::Value = serde_json::from_str(c_text(&report)).unwrap();
    assert_eq!(report["state"], "resolved");
    assert_eq!(report["module"], "controls");
    assert_eq!(report["module_label"], fixture.display().to_string());
    assert_eq!(report["symbol"], "T3000_HandleWebViewMsgBridge");
    assert_eq!(report["shape"], "bridge");
    assert_eq!(report["auxiliary"], serde_json::json!(["basic_settings"]));
}

#[test]
fn forwarded_message_is_answered_by_fixture() {
    let (_guard, _) = with_fixture();

    let mut buf = ping_buffer();
    let cap = buf.len() as c_int;
    let rc = unsafe { T3Bridge_HandleWebViewMsg(7, buf.as_mut_ptr().cast(), cap) };
    assert_eq!(rc, 0);
    assert_eq!(c_text(&buf), r#"{"fixture":"ping","source":7}"#);
}

#[test]
fn panel_exports_follow_fixture_exports() {
    let (_guard, _) = with_fixture();
    let mut buf = [0u8; 64];
    let cap = buf.len() as c_int;

    let rc = unsafe { T3Bridge_GetDeviceBasicSettings(3, buf.as_mut_ptr().cast(), cap) };
    assert_eq!(rc, 0);
    assert_eq!(c_text(&buf), r#"{"panel":3}"#);

    // Not exported by the fixture.
    let rc = unsafe { T3Bridge_GetTrendlogList(3, buf.as_mut_ptr().cast(), cap) };
    assert_eq!(rc, -1);
    let doc: serde_json::Value = serde_json::from_str(c_text(&buf)).unwrap();
    assert_eq!(doc["export"], PanelExport::TrendlogList.symbol());
}

#[test]
fn built_shim_library_resolves_the_same_target() {
    let (_guard, fixture) = with_fixture();
    let shim = ShimLibrary::load(built_library("t3bridge_abi")).unwrap();

    assert_eq!(shim.force_resolve().unwrap(), 1);
    let mut buf = ping_buffer();
    assert_eq!(shim.invoke(12, &mut buf).unwrap(), 0);
    assert_eq!(c_text(&buf), r#"{"fixture":"ping","source":12}"#);

    let mut report = vec![0u8; 2048];
    assert_eq!(shim.report(&mut report).unwrap(), 0);
    let report: serde_json::Value = serde_json::from_str(c_text(&report)).unwrap();
    assert_eq!(report["module"], "controls");
    assert_eq!(report["module_label"], fixture.display().to_string());
}
