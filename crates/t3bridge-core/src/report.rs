//! Point-in-time snapshot of resolution and trail health.

use serde::Serialize;

use crate::cell::{ResolutionCell, ResolutionState};
use crate::config::TrailMode;
use crate::target::{ModuleSlot, PanelExport, Shape};
use crate::trail::DiagnosticTrail;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub state: ResolutionState,
    pub passes: u64,
    pub module: Option<ModuleSlot>,
    pub module_label: Option<String>,
    pub symbol: Option<&'static str>,
    pub shape: Option<Shape>,
    pub auxiliary: Vec<PanelExport>,
    pub trail: TrailSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailSummary {
    pub mode: TrailMode,
    pub directory: Option<String>,
    pub written: u64,
    pub failures: u64,
}

impl TrailSummary {
    #[must_use]
    pub fn of(trail: &DiagnosticTrail) -> Self {
        Self {
            mode: trail.mode(),
            directory: trail.root().map(|p| p.display().to_string()),
            written: trail.written(),
            failures: trail.failures(),
        }
    }
}

impl ResolutionReport {
    /// Read the cell without triggering resolution.
    #[must_use]
    pub fn capture(cell: &ResolutionCell, trail: TrailSummary) -> Self {
        let target = cell.target();
        Self {
            state: cell.state(),
            passes: cell.passes(),
            module: target.map(|t| t.module),
            module_label: target.map(|t| t.module_label.clone()),
            symbol: target.map(|t| t.symbol),
            shape: target.map(|t| t.shape()),
            auxiliary: target.map(|t| t.auxiliary.available()).unwrap_or_default(),
            trail,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
