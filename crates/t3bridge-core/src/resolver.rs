//! Module search for the real `HandleWebViewMsg` entry point.
//!
//! [`SearchResolver`] walks [`ModuleSlot::PRIORITY`]; at each module it tries
//! every bridge-shaped candidate, then every direct-shaped candidate, and stops
//! at the first usable hit. The platform side (which modules exist, how a name
//! becomes a function pointer) sits behind [`ModuleSource`] / [`ModuleProbe`].

use std::sync::Arc;

use thiserror::Error;

use crate::candidates::{DEFAULT_CANDIDATES, SymbolCandidate, probe_order};
use crate::target::{AuxiliaryExports, ModuleSlot, PanelExport, PanelFn, Target, TargetFn};
use crate::trail::{ProbeObserver, ProbeVerdict, TrailEvent};

/// Capability to locate the forwarding target.
pub trait TargetResolver: Send + Sync {
    /// One full probing pass. `None` means nothing usable is loaded.
    fn resolve(&self) -> Option<Target>;

    /// Called by the resolution cell right before [`TargetResolver::resolve`].
    fn pass_started(&self, _pass: u64, _forced: bool) {}
}

/// Outcome of looking a single name up in a single module.
#[derive(Debug, Clone, Copy)]
pub enum ProbeOutcome<T> {
    Hit(T),
    Miss,
    /// The symbol exists but must not be used.
    Rejected(&'static str),
}

impl<T> ProbeOutcome<T> {
    #[must_use]
    pub fn verdict(&self) -> ProbeVerdict {
        match self {
            Self::Hit(_) => ProbeVerdict::Hit,
            Self::Miss => ProbeVerdict::Miss,
            Self::Rejected(reason) => ProbeVerdict::Rejected(*reason),
        }
    }
}

/// An opened, already-loaded module.
pub trait ModuleProbe {
    /// File name or path identifying the module in trail lines.
    fn label(&self) -> &str;

    /// Look up `candidate` with the calling convention it declares.
    fn entry(&self, candidate: &SymbolCandidate) -> ProbeOutcome<TargetFn>;

    /// Look up an optional panel-scoped export.
    fn panel_export(&self, name: &str) -> Option<PanelFn>;

    /// Called on the winning module so the source can keep it mapped for the
    /// rest of the process lifetime.
    fn retain(self: Box<Self>) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("{module} is not loaded in this process")]
    NotLoaded { module: String },
    #[error("{module} could not be opened: {reason}")]
    Open { module: String, reason: String },
    #[error("hosting module could not be located: {0}")]
    Unlocatable(String),
}

/// Platform facility that opens the modules named by [`ModuleSlot`]. Sources
/// must only hand out modules that are already mapped; loading new code is not
/// their job.
pub trait ModuleSource: Send + Sync {
    fn open(&self, slot: ModuleSlot) -> Result<Box<dyn ModuleProbe>, ModuleError>;
}

/// The default [`TargetResolver`]: prioritized module x candidate search with
/// every probe reported to an observer.
pub struct SearchResolver<S> {
    source: S,
    candidates: Vec<SymbolCandidate>,
    observer: Arc<dyn ProbeObserver>,
}

impl<S: ModuleSource> SearchResolver<S> {
    /// Resolver over [`DEFAULT_CANDIDATES`].
    pub fn new(source: S, observer: Arc<dyn ProbeObserver>) -> Self {
        Self::with_candidates(source, DEFAULT_CANDIDATES, observer)
    }

    pub fn with_candidates(
        source: S,
        candidates: &[SymbolCandidate],
        observer: Arc<dyn ProbeObserver>,
    ) -> Self {
        Self {
            source,
            candidates: probe_order(candidates),
            observer,
        }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Candidates in per-module probe order.
    #[must_use]
    pub fn candidates(&self) -> &[SymbolCandidate] {
        &self.candidates
    }

    fn probe_module(
        &self,
        slot: ModuleSlot,
        module: &dyn ModuleProbe,
    ) -> Option<(TargetFn, &'static str)> {
        for candidate in &self.candidates {
            let outcome = module.entry(candidate);
            self.observer.record(&TrailEvent::Probe {
                module: slot,
                label: module.label(),
                symbol: candidate.name,
                shape: candidate.shape,
                verdict: outcome.verdict(),
            });
            if let ProbeOutcome::Hit(entry) = outcome {
                if entry.shape() == candidate.shape {
                    return Some((entry, candidate.name));
                }
            }
        }
        None
    }

    fn auxiliary(&self, slot: ModuleSlot, module: &dyn ModuleProbe) -> AuxiliaryExports {
        let mut aux = AuxiliaryExports::default();
        for export in PanelExport::ALL {
            let found = module.panel_export(export.symbol());
            self.observer.record(&TrailEvent::AuxiliaryProbe {
                module: slot,
                export,
                found: found.is_some(),
            });
            if let Some(f) = found {
                aux.set(export, f);
            }
        }
        aux
    }
}

impl<S: ModuleSource> TargetResolver for SearchResolver<S> {
    fn pass_started(&self, pass: u64, forced: bool) {
        self.observer.record(&TrailEvent::PassStarted { pass, forced });
    }

    fn resolve(&self) -> Option<Target> {
        let mut probes = 0usize;
        for slot in ModuleSlot::PRIORITY {
            let module = match self.source.open(slot) {
                Ok(module) => module,
                Err(err) => {
                    let reason = err.to_string();
                    self.observer.record(&TrailEvent::ModuleUnavailable {
                        module: slot,
                        reason: &reason,
                    });
                    continue;
                }
            };

            probes += self.candidates.len();
            let Some((entry, symbol)) = self.probe_module(slot, module.as_ref()) else {
                continue;
            };

            let auxiliary = self.auxiliary(slot, module.as_ref());
            let target = Target {
                entry,
                symbol,
                module: slot,
                module_label: module.label().to_string(),
                auxiliary,
            };
            self.observer.record(&TrailEvent::Resolved {
                module: slot,
                label: &target.module_label,
                symbol,
                shape: entry.shape(),
            });
            module.retain();
            return Some(target);
        }

        self.observer.record(&TrailEvent::Failed { probes });
        None
    }
}
