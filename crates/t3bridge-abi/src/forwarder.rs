//! Call forwarding into the resolved host entry point.
//!
//! A [`Forwarder`] borrows the resolution cell, the resolver and the trail; it
//! carries no state of its own, so any number of threads can forward through
//! copies of it at once.

use std::ffi::{c_char, c_int};

use t3bridge_core::diagnostic::{
    DiagnosticDocument, MSG_EXCEPTION, MSG_PANEL_UNAVAILABLE, PanelDiagnostic, RC_INVALID_ARGUMENT,
    RC_UNAVAILABLE, write_c_string, write_document,
};
use t3bridge_core::target::{PANEL_ID_RANGE, PanelExport};
use t3bridge_core::trail::{ProbeObserver, TrailEvent};
use t3bridge_core::{ResolutionCell, ResolutionReport, Target, TargetFn, TargetResolver};

/// Export name of the main forwarding entry point.
pub const ENTRY_FORWARD: &str = "T3Bridge_HandleWebViewMsg";

#[derive(Clone, Copy)]
pub struct Forwarder<'a> {
    cell: &'a ResolutionCell,
    resolver: &'a dyn TargetResolver,
    trail: &'a dyn ProbeObserver,
}

impl<'a> Forwarder<'a> {
    #[must_use]
    pub fn new(
        cell: &'a ResolutionCell,
        resolver: &'a dyn TargetResolver,
        trail: &'a dyn ProbeObserver,
    ) -> Self {
        Self {
            cell,
            resolver,
            trail,
        }
    }

    /// The target, resolving first if nobody has tried yet.
    #[must_use]
    pub fn target(&self) -> Option<&'a Target> {
        self.cell.ensure(self.resolver)
    }

    /// Cached target, or a fresh probing pass if the last one failed.
    #[must_use]
    pub fn force(&self) -> Option<&'a Target> {
        self.cell.force(self.resolver)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.target().is_some()
    }

    /// Forward one WebView message.
    ///
    /// Returns the callee's code verbatim, `-1` with a diagnostic document in
    /// `buffer` when nothing is resolved, or `-2` without touching `buffer`
    /// on a null pointer or non-positive capacity.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or valid for reads and writes of `capacity` bytes.
    pub unsafe fn invoke(&self, action: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
        if buffer.is_null() || capacity <= 0 {
            self.trail.record(&TrailEvent::ArgumentRejected {
                entry: ENTRY_FORWARD,
                action,
                capacity,
            });
            return RC_INVALID_ARGUMENT;
        }

        let Some(target) = self.target() else {
            self.trail.record(&TrailEvent::ForwardUnavailable {
                entry: ENTRY_FORWARD,
                action,
            });
            // SAFETY: checked non-null and positive above; caller guarantees size.
            let buf = unsafe { caller_buffer(buffer, capacity) };
            write_document(buf, &DiagnosticDocument::unavailable(action).to_json());
            return RC_UNAVAILABLE;
        };

        // SAFETY: forwarding the caller's buffer contract unchanged.
        let rc = unsafe { dispatch(target.entry, action, buffer, capacity) };
        // SAFETY: as above.
        unsafe { terminate(buffer, capacity) };
        rc
    }

    /// Forward a panel-scoped request to the matching host export.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or valid for reads and writes of `capacity` bytes.
    pub unsafe fn invoke_panel(
        &self,
        export: PanelExport,
        panel_id: c_int,
        buffer: *mut c_char,
        capacity: c_int,
    ) -> c_int {
        if buffer.is_null() || capacity <= 0 || !PANEL_ID_RANGE.contains(&panel_id) {
            self.trail.record(&TrailEvent::PanelRejected {
                entry: export.entry_name(),
                panel_id,
                capacity,
            });
            return RC_INVALID_ARGUMENT;
        }

        let Some(panel_fn) = self.target().and_then(|t| t.auxiliary.get(export)) else {
            self.trail.record(&TrailEvent::PanelUnavailable {
                entry: export.entry_name(),
                panel_id,
            });
            // SAFETY: checked above.
            let buf = unsafe { caller_buffer(buffer, capacity) };
            let doc = PanelDiagnostic::error(panel_id, export, MSG_PANEL_UNAVAILABLE);
            write_document(buf, &doc.to_json());
            return RC_UNAVAILABLE;
        };

        // SAFETY: host export with the panel signature; caller's buffer contract.
        let rc = unsafe { panel_fn(panel_id, buffer, capacity) };
        // SAFETY: as above.
        unsafe { terminate(buffer, capacity) };
        rc
    }
}

unsafe fn dispatch(entry: TargetFn, action: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
    match entry {
        // In place: the request text is the input and the reply overwrites it.
        // SAFETY: caller upholds the buffer contract.
        TargetFn::Bridge(f) => unsafe { f(buffer.cast_const(), buffer, capacity, action) },
        // SAFETY: as above.
        TargetFn::Direct(f) => unsafe { f(action, buffer, capacity) },
    }
}

/// # Safety
///
/// `buffer` non-null and valid for `capacity > 0` bytes.
unsafe fn caller_buffer<'b>(buffer: *mut c_char, capacity: c_int) -> &'b mut [u8] {
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts_mut(buffer.cast::<u8>(), capacity as usize) }
}

/// Keep whatever the callee left behind a C string.
unsafe fn terminate(buffer: *mut c_char, capacity: c_int) {
    // SAFETY: capacity > 0 checked by every caller.
    unsafe { *buffer.add(capacity as usize - 1) = 0 };
}

/// Serialize `report` into the caller's buffer.
///
/// `0` on success, `-1` (buffer left as an empty string) when it does not fit,
/// `-2` on a null pointer or non-positive capacity.
///
/// # Safety
///
/// `buffer` must be null or valid for writes of `capacity` bytes.
pub unsafe fn write_report(report: &ResolutionReport, buffer: *mut c_char, capacity: c_int) -> c_int {
    if buffer.is_null() || capacity <= 0 {
        return RC_INVALID_ARGUMENT;
    }
    // SAFETY: checked above.
    let buf = unsafe { caller_buffer(buffer, capacity) };
    match write_c_string(buf, &report.to_json()) {
        Ok(_) => 0,
        Err(_) => {
            buf[0] = 0;
            RC_UNAVAILABLE
        }
    }
}

/// Fallback for a panic inside the forwarding export.
///
/// # Safety
///
/// `buffer` must be null or valid for writes of `capacity` bytes.
pub unsafe fn write_exception(action: c_int, buffer: *mut c_char, capacity: c_int) -> c_int {
    if !buffer.is_null() && capacity > 0 {
        // SAFETY: checked above.
        let buf = unsafe { caller_buffer(buffer, capacity) };
        write_document(buf, &DiagnosticDocument::exception(action).to_json());
    }
    RC_UNAVAILABLE
}

/// Fallback for a panic inside a panel export.
///
/// # Safety
///
/// `buffer` must be null or valid for writes of `capacity` bytes.
pub unsafe fn write_panel_exception(
    export: PanelExport,
    panel_id: c_int,
    buffer: *mut c_char,
    capacity: c_int,
) -> c_int {
    if !buffer.is_null() && capacity > 0 {
        // SAFETY: checked above.
        let buf = unsafe { caller_buffer(buffer, capacity) };
        write_document(buf, &PanelDiagnostic::error(panel_id, export, MSG_EXCEPTION).to_json());
    }
    RC_UNAVAILABLE
}
