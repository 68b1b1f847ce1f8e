//! # t3bridge-core
//!
//! Safe logic behind the T3000 WebView bridge shim.
//!
//! The bridge is a shared library loaded next to the T3000 GUI application. It
//! exports one stable C entry point and forwards every call into the real
//! `HandleWebViewMsg` implementation, which it finds at runtime by probing the
//! modules already loaded in the process. This crate owns everything that can be
//! expressed without `unsafe`: the candidate tables, the call-shape types, the
//! module search order, the one-time resolution cell, the diagnostic payloads
//! written back to callers, the diagnostic trail and the runtime configuration.
//!
//! # Architecture
//!
//! ```text
//! C caller -> ABI export (t3bridge-abi) -> Forwarder -> ResolutionCell
//!                                                         |
//!                                   SearchResolver -> ModuleSource (platform)
//! ```
//!
//! The ABI crate supplies the platform [`resolver::ModuleSource`] and performs
//! the actual calls through the resolved function pointers.

#![deny(unsafe_code)]

pub mod action;
pub mod candidates;
pub mod cell;
pub mod config;
pub mod diagnostic;
pub mod report;
pub mod resolver;
pub mod target;
pub mod trail;

pub use cell::{ResolutionCell, ResolutionState};
pub use report::ResolutionReport;
pub use resolver::{SearchResolver, TargetResolver};
pub use target::{ModuleSlot, Shape, Target, TargetFn};
