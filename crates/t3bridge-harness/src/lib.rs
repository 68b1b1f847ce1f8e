//! Diagnostic harness for the T3000 WebView bridge.
//!
//! Loads a built bridge library the way the host does and reports what it
//! sees: whether a host entry point resolves, what the bridge's own
//! resolution report says, and what a forwarded message returns.

#![forbid(unsafe_code)]

pub mod session;

pub use session::{HarnessError, InvokeReport, ProbeReport};
