//! One harness run against a built bridge library.
//!
//! Every operation loads the library by path, calls into its exports through
//! [`ShimLibrary`], and returns a serializable report for the CLI to print.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use t3bridge_abi::client::{ClientError, ShimLibrary};
use t3bridge_core::action::WebViewAction;

/// Buffer used for `T3Bridge_ResolutionReport`.
pub const REPORT_CAPACITY: usize = 4096;
/// Default buffer for forwarded messages.
pub const DEFAULT_INVOKE_CAPACITY: usize = 8192;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("input of {input} bytes does not fit a {capacity}-byte buffer with its terminator")]
    InputTooLarge { input: usize, capacity: usize },
    #[error("capacity must be positive")]
    ZeroCapacity,
    #[error("resolution report is not valid JSON: {0}")]
    Report(#[from] serde_json::Error),
    #[error("resolution report did not fit in {0} bytes")]
    ReportTruncated(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub library: PathBuf,
    pub resolved: bool,
    /// Snapshot as written by the bridge itself.
    pub resolution: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvokeReport {
    pub library: PathBuf,
    pub action: i32,
    pub action_name: Option<&'static str>,
    pub capacity: usize,
    pub return_code: i32,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub library: PathBuf,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEntry {
    pub code: i32,
    pub name: &'static str,
}

/// Force a resolution pass and capture the bridge's own report.
pub fn probe(library: &Path) -> Result<ProbeReport, HarnessError> {
    let shim = ShimLibrary::load(library)?;
    let resolved = shim.force_resolve()? == 1;
    let mut buf = vec![0u8; REPORT_CAPACITY];
    if shim.report(&mut buf)? != 0 {
        return Err(HarnessError::ReportTruncated(REPORT_CAPACITY));
    }
    let resolution = serde_json::from_str(&c_text(&buf))?;
    Ok(ProbeReport {
        library: shim.path().to_path_buf(),
        resolved,
        resolution,
    })
}

/// Send `input` as a WebView message and capture the reply.
pub fn invoke(
    library: &Path,
    action: i32,
    input: &str,
    capacity: usize,
) -> Result<InvokeReport, HarnessError> {
    let mut buf = request_buffer(input, capacity)?;
    let shim = ShimLibrary::load(library)?;
    let return_code = shim.invoke(action, &mut buf)?;
    Ok(InvokeReport {
        library: shim.path().to_path_buf(),
        action,
        action_name: WebViewAction::from_code(action).map(WebViewAction::wire_name),
        capacity,
        return_code,
        output: c_text(&buf),
    })
}

pub fn available(library: &Path) -> Result<AvailabilityReport, HarnessError> {
    let shim = ShimLibrary::load(library)?;
    let available = shim.is_available()? == 1;
    Ok(AvailabilityReport {
        library: shim.path().to_path_buf(),
        available,
    })
}

/// Every action code the host understands.
#[must_use]
pub fn actions() -> Vec<ActionEntry> {
    WebViewAction::ALL
        .into_iter()
        .map(|action| ActionEntry {
            code: action.code(),
            name: action.wire_name(),
        })
        .collect()
}

/// `input` followed by a NUL, padded with zeros to `capacity`.
pub fn request_buffer(input: &str, capacity: usize) -> Result<Vec<u8>, HarnessError> {
    if capacity == 0 {
        return Err(HarnessError::ZeroCapacity);
    }
    if input.len() + 1 > capacity {
        return Err(HarnessError::InputTooLarge {
            input: input.len(),
            capacity,
        });
    }
    let mut buf = vec![0u8; capacity];
    buf[..input.len()].copy_from_slice(input.as_bytes());
    Ok(buf)
}

/// Text up to the first NUL (or the whole buffer), lossily decoded.
#[must_use]
pub fn c_text(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_buffer_is_terminated_and_padded() {
        let buf = request_buffer("ping", 8).unwrap();
        assert_eq!(buf, b"ping\0\0\0\0");
    }

    #[test]
    fn request_buffer_needs_room_for_terminator() {
        assert!(matches!(
            request_buffer("ping", 4),
            Err(HarnessError::InputTooLarge { input: 4, capacity: 4 })
        ));
        assert!(matches!(request_buffer("", 0), Err(HarnessError::ZeroCapacity)));
    }

    #[test]
    fn c_text_stops_at_nul() {
        assert_eq!(c_text(b"ab\0cd"), "ab");
        assert_eq!(c_text(b"abc"), "abc");
    }

    #[test]
    fn actions_cover_host_enumeration() {
        let list = actions();
        assert_eq!(list.len(), 18);
        assert_eq!(list[0], ActionEntry { code: 0, name: "GET_PANEL_DATA" });
        assert_eq!(list[10].name, "SAVE_LIBRAY_DATA");
        assert_eq!(list[17].code, 17);
    }
}
