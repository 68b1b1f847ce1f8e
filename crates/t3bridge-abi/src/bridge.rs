//! The process-wide bridge: configuration, trail, resolution cell and the
//! platform resolver, built on first use.

use std::sync::{Arc, LazyLock};

use t3bridge_core::config::BridgeConfig;
use t3bridge_core::report::TrailSummary;
use t3bridge_core::trail::{DiagnosticTrail, ProbeObserver, TrailEvent};
use t3bridge_core::{ResolutionCell, ResolutionReport, SearchResolver};

use crate::forwarder::Forwarder;
use crate::host_modules::HostModules;

pub struct HostBridge {
    config: BridgeConfig,
    trail: Arc<DiagnosticTrail>,
    cell: ResolutionCell,
    resolver: SearchResolver<HostModules>,
}

static HOST_BRIDGE: LazyLock<HostBridge> = LazyLock::new(HostBridge::from_env);

/// The single bridge instance behind the exports.
pub fn host_bridge() -> &'static HostBridge {
    &HOST_BRIDGE
}

impl HostBridge {
    /// Configuration from the environment, trail beside the executable.
    #[must_use]
    pub fn from_env() -> Self {
        let (config, rejected) = BridgeConfig::from_env();
        let trail = Arc::new(DiagnosticTrail::beside_executable(config.trail_mode));
        for err in &rejected {
            trail.record(&TrailEvent::ConfigFallback {
                detail: &err.to_string(),
            });
        }
        Self::new(config, trail, &crate::bridge_abi::own_entry_points())
    }

    #[must_use]
    pub fn new(config: BridgeConfig, trail: Arc<DiagnosticTrail>, own_entries: &[usize]) -> Self {
        let modules = HostModules::new(&config, own_entries);
        let resolver = SearchResolver::new(modules, trail.clone());
        Self {
            config,
            trail,
            cell: ResolutionCell::new(),
            resolver,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn trail(&self) -> &DiagnosticTrail {
        &self.trail
    }

    #[must_use]
    pub fn cell(&self) -> &ResolutionCell {
        &self.cell
    }

    #[must_use]
    pub fn forwarder(&self) -> Forwarder<'_> {
        Forwarder::new(&self.cell, &self.resolver, self.trail.as_ref())
    }

    /// Startup hook body: resolve now and note the outcome.
    pub fn initialize(&self) -> bool {
        let resolved = self.forwarder().is_available();
        self.trail.record(&TrailEvent::Initialize { resolved });
        resolved
    }

    #[must_use]
    pub fn report(&self) -> ResolutionReport {
        ResolutionReport::capture(&self.cell, TrailSummary::of(&self.trail))
    }
}

/// Put a caught export panic on the trail. Never unwinds, even if the bridge
/// itself could not be built.
pub(crate) fn record_panic(entry: &str) {
    let _ = std::panic::catch_unwind(|| {
        host_bridge()
            .trail
            .record(&TrailEvent::PanicCaught { entry });
    });
}

#[cfg(test)]
mod tests {
    use t3bridge_core::ResolutionState;
    use t3bridge_core::config::TrailMode;
    use t3bridge_core::trail::TRAIL_DIR_NAME;

    use super::*;

    fn quiet_bridge(dir: &std::path::Path) -> HostBridge {
        let config = BridgeConfig {
            controls_module: "libt3bridge-test-absent.so".to_string(),
            ..BridgeConfig::default()
        };
        let trail = Arc::new(DiagnosticTrail::at(dir.join(TRAIL_DIR_NAME), TrailMode::Text));
        HostBridge::new(config, trail, &[])
    }

    #[test]
    fn fresh_bridge_has_not_attempted() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = quiet_bridge(dir.path());
        let report = bridge.report();
        assert_eq!(report.state, ResolutionState::NotAttempted);
        assert_eq!(report.trail.mode, TrailMode::Text);
        assert!(report.trail.directory.unwrap().ends_with(TRAIL_DIR_NAME));
    }

    #[test]
    fn initialize_without_host_records_failure_on_trail() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = quiet_bridge(dir.path());
        assert!(!bridge.initialize());
        assert_eq!(bridge.cell().state(), ResolutionState::Failed);
        // pass start, probes, module notes, failure, initialize
        assert!(bridge.trail().written() > 3);
        assert_eq!(bridge.trail().failures(), 0);
    }
}
