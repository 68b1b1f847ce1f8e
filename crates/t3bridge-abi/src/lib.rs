// Exports take raw buffers from C callers and check them at runtime, so
// per-function safety docs would only repeat the module docs.
#![allow(clippy::missing_safety_doc)]
//! # t3bridge-abi
//!
//! Stable extern "C" surface of the T3000 WebView bridge.
//!
//! This crate produces the shim library loaded next to the T3000 GUI. Each
//! export goes through the process-wide [`bridge::HostBridge`], which resolves
//! the real `HandleWebViewMsg` among the modules already in the process and
//! forwards calls to it.
//!
//! # Architecture
//!
//! ```text
//! C caller -> T3Bridge_* export -> panic boundary -> Forwarder -> host entry point
//!                                                        \-> diagnostic JSON
//! ```
//!
//! Resolution happens on `T3Bridge_Initialize` or on the first forwarded call.
//! With the `load-hook` feature it runs from a load-time constructor instead
//! (ELF and Mach-O targets; ignored on Windows, where constructors hold the
//! loader lock).

#[macro_use]
mod macros;

pub mod bridge;
pub mod bridge_abi;
pub mod client;
pub mod forwarder;
pub mod host_modules;
pub mod panel_abi;

#[cfg(all(feature = "load-hook", not(windows)))]
mod load_hook;

pub use bridge::{HostBridge, host_bridge};
pub use forwarder::Forwarder;
