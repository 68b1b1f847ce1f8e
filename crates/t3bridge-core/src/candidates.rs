//! Export names the real `HandleWebViewMsg` implementation may be published
//! under.
//!
//! The list is fixed at build time. Earlier entries are preferred, and at any
//! given module every bridge-shaped name is tried before any direct-shaped name.

use crate::target::Shape;

/// One candidate export name and its calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolCandidate {
    pub name: &'static str,
    pub shape: Shape,
}

impl SymbolCandidate {
    #[must_use]
    pub const fn bridge(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Bridge,
        }
    }

    #[must_use]
    pub const fn direct(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Direct,
        }
    }
}

/// Names probed in every module, in preference order.
pub const DEFAULT_CANDIDATES: &[SymbolCandidate] = &[
    SymbolCandidate::bridge("T3000_HandleWebViewMsgBridge"),
    SymbolCandidate::bridge("BacnetWebView_HandleWebViewMsgBridge"),
    SymbolCandidate::direct("BacnetWebView_HandleWebViewMsg"),
    SymbolCandidate::direct("T3000_RealHandleWebViewMsg_CPP"),
    SymbolCandidate::direct("HandleWebViewMsg"),
];

/// Reorders `candidates` into per-module probe order: bridge names first, then
/// direct names, each group keeping its original relative order.
#[must_use]
pub fn probe_order(candidates: &[SymbolCandidate]) -> Vec<SymbolCandidate> {
    let (mut ordered, direct): (Vec<_>, Vec<_>) = candidates
        .iter()
        .copied()
        .partition(|c| c.shape == Shape::Bridge);
    ordered.extend(direct);
    ordered
}
