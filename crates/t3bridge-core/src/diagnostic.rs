//! Diagnostic payloads and bounded buffer writes.
//!
//! Whenever the bridge cannot reach the host implementation it writes a small
//! JSON document into the caller's buffer, so the failure is self-describing
//! even without the trail file. Every write here is bounded by the slice it is
//! given and always leaves a NUL-terminated string behind.

use serde::Serialize;

use crate::action::action_name;
use crate::target::PanelExport;

/// Success.
pub const RC_OK: i32 = 0;
/// No target resolved, or the buffer is too small for the payload.
pub const RC_UNAVAILABLE: i32 = -1;
/// Null buffer, non-positive capacity, or an out-of-range argument.
pub const RC_INVALID_ARGUMENT: i32 = -2;

/// Smallest well-formed document, used when the full payload does not fit.
pub const MINIMAL_DOCUMENT: &str = "{}";

pub const MSG_UNAVAILABLE: &str =
    "T3000 integration not ready: no HandleWebViewMsg export is loaded in this process";
pub const MSG_EXCEPTION: &str = "exception in bridge";
pub const MSG_PANEL_UNAVAILABLE: &str = "export not present in the resolved host module";

/// Status document written into caller buffers.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticDocument<'a> {
    pub status: &'static str,
    pub action: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<&'static str>,
    pub message: &'a str,
}

impl<'a> DiagnosticDocument<'a> {
    #[must_use]
    pub fn error(action: i32, message: &'a str) -> Self {
        Self {
            status: "error",
            action,
            action_name: action_name(action),
            message,
        }
    }

    /// The "integration not ready" document.
    #[must_use]
    pub fn unavailable(action: i32) -> Self {
        Self::error(action, MSG_UNAVAILABLE)
    }

    /// Written after a caught panic: status, action and message only.
    #[must_use]
    pub fn exception(action: i32) -> Self {
        Self {
            action_name: None,
            ..Self::error(action, MSG_EXCEPTION)
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| MINIMAL_DOCUMENT.to_string())
    }
}

/// Written when a panel-scoped export cannot be served.
#[derive(Debug, Clone, Serialize)]
pub struct PanelDiagnostic<'a> {
    pub status: &'static str,
    pub panel_id: i32,
    pub export: &'static str,
    pub message: &'a str,
}

impl<'a> PanelDiagnostic<'a> {
    #[must_use]
    pub fn error(panel_id: i32, export: PanelExport, message: &'a str) -> Self {
        Self {
            status: "error",
            panel_id,
            export: export.symbol(),
            message,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| MINIMAL_DOCUMENT.to_string())
    }
}

/// Byte length (without NUL) of the unavailable document for `action`.
#[must_use]
pub fn unavailable_document_len(action: i32) -> usize {
    DiagnosticDocument::unavailable(action).to_json().len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTooSmall {
    pub needed: usize,
    pub capacity: usize,
}

/// Copy `text` plus a terminating NUL into `buf`.
///
/// Either the whole string fits or nothing is written.
pub fn write_c_string(buf: &mut [u8], text: &str) -> Result<usize, BufferTooSmall> {
    let bytes = text.as_bytes();
    let needed = bytes.len() + 1;
    if needed > buf.len() {
        return Err(BufferTooSmall {
            needed,
            capacity: buf.len(),
        });
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    buf[bytes.len()] = 0;
    Ok(bytes.len())
}

/// What [`write_document`] managed to put in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentWrite {
    /// The full document, `len` bytes before the NUL.
    Full(usize),
    /// Only [`MINIMAL_DOCUMENT`].
    Minimal,
    /// Only a NUL byte.
    Empty,
    /// Zero-length buffer; nothing written.
    Nothing,
}

/// Write `document`, degrading to `{}` and then to an empty string when the
/// buffer is too small. Never writes past `buf.len()` and never leaves an
/// unterminated prefix.
pub fn write_document(buf: &mut [u8], document: &str) -> DocumentWrite {
    if let Ok(len) = write_c_string(buf, document) {
        return DocumentWrite::Full(len);
    }
    if write_c_string(buf, MINIMAL_DOCUMENT).is_ok() {
        return DocumentWrite::Minimal;
    }
    match buf.first_mut() {
        Some(first) => {
            *first = 0;
            DocumentWrite::Empty
        }
        None => DocumentWrite::Nothing,
    }
}
