//! One-time resolution cell.
//!
//! Holds the process-wide [`Target`] and the resolution state machine:
//!
//! ```text
//! NOT_ATTEMPTED -> RESOLVING -> RESOLVED
//!                           \-> FAILED -> (force) RESOLVING -> ...
//! ```
//!
//! Readers take a lock-free fast path once the state is terminal. Probing
//! passes are serialized by `gate`; a caller that queued behind a pass adopts
//! that pass's result instead of probing again. The target is published
//! through a `OnceLock`, so it is written at most once and every reader sees a
//! fully built value.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::resolver::TargetResolver;
use crate::target::Target;

const STATE_NOT_ATTEMPTED: u8 = 0;
const STATE_RESOLVING: u8 = 1;
const STATE_RESOLVED: u8 = 2;
const STATE_FAILED: u8 = 3;

/// Observable resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    NotAttempted,
    Resolving,
    Resolved,
    Failed,
}

impl ResolutionState {
    fn from_u8(v: u8) -> Self {
        match v {
            STATE_RESOLVING => Self::Resolving,
            STATE_RESOLVED => Self::Resolved,
            STATE_FAILED => Self::Failed,
            _ => Self::NotAttempted,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

#[derive(Debug)]
pub struct ResolutionCell {
    state: AtomicU8,
    target: OnceLock<Target>,
    gate: Mutex<()>,
    passes: AtomicU64,
}

impl Default for ResolutionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionCell {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_NOT_ATTEMPTED),
            target: OnceLock::new(),
            gate: Mutex::new(()),
            passes: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        ResolutionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The resolved target, without triggering resolution.
    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        self.target.get()
    }

    /// Number of completed probing passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Resolve if nobody has tried yet; otherwise return the settled result.
    pub fn ensure(&self, resolver: &dyn TargetResolver) -> Option<&Target> {
        if let Some(target) = self.target.get() {
            return Some(target);
        }
        if self.state.load(Ordering::Acquire) == STATE_FAILED {
            return None;
        }

        let _gate = self.gate.lock();
        // Someone may have finished while we waited.
        match self.state.load(Ordering::Acquire) {
            STATE_RESOLVED => self.target.get(),
            STATE_FAILED => None,
            _ => self.run_pass(resolver, false),
        }
    }

    /// Re-run resolution unless a target is already cached.
    ///
    /// Concurrent callers never probe in parallel: whoever queues behind an
    /// in-flight pass takes that pass's result.
    pub fn force(&self, resolver: &dyn TargetResolver) -> Option<&Target> {
        if let Some(target) = self.target.get() {
            return Some(target);
        }
        let seen = self.passes.load(Ordering::Acquire);

        let _gate = self.gate.lock();
        if let Some(target) = self.target.get() {
            return Some(target);
        }
        if self.passes.load(Ordering::Acquire) != seen {
            return None;
        }
        self.run_pass(resolver, true)
    }

    /// Must be called with `gate` held.
    fn run_pass(&self, resolver: &dyn TargetResolver, forced: bool) -> Option<&Target> {
        self.state.store(STATE_RESOLVING, Ordering::Release);
        let pass = self.passes.load(Ordering::Acquire) + 1;
        let guard = PassGuard { state: &self.state };

        resolver.pass_started(pass, forced);
        let found = resolver.resolve();
        std::mem::forget(guard);
        // Counted on completion so queued forcers can tell a pass finished.
        self.passes.store(pass, Ordering::Release);

        match found {
            Some(target) => {
                // Only ever set under the gate while unresolved.
                let _ = self.target.set(target);
                self.state.store(STATE_RESOLVED, Ordering::Release);
                self.target.get()
            }
            None => {
                self.state.store(STATE_FAILED, Ordering::Release);
                None
            }
        }
    }
}

/// Leaves the cell in `FAILED` if a resolver panics mid-pass, so later
/// callers can still force a retry.
struct PassGuard<'a> {
    state: &'a AtomicU8,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.state.store(STATE_FAILED, Ordering::Release);
    }
}
