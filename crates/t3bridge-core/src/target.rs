//! Call shapes and the resolved target.
//!
//! The real `HandleWebViewMsg` implementation has been published under two
//! calling conventions across host builds. Both are modelled as one sum type so
//! dispatch is checked for exhaustiveness at compile time.

use std::ffi::{c_char, c_int};
use std::ops::Range;

use serde::Serialize;

/// `(input, output, output_len, source) -> rc`: text-in / text-out bridge.
pub type BridgeFn = unsafe extern "C" fn(*const c_char, *mut c_char, c_int, c_int) -> c_int;

/// `(action, buffer, buffer_len) -> rc`: action code with an in/out buffer.
pub type DirectFn = unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int;

/// `(panel_id, buffer, buffer_size) -> rc`: optional panel-scoped exports.
pub type PanelFn = unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int;

/// Which calling convention a candidate symbol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Bridge,
    Direct,
}

impl Shape {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::Direct => "direct",
        }
    }
}

/// A resolved entry point, tagged with its shape.
#[derive(Debug, Clone, Copy)]
pub enum TargetFn {
    Bridge(BridgeFn),
    Direct(DirectFn),
}

impl TargetFn {
    #[must_use]
    pub const fn shape(self) -> Shape {
        match self {
            Self::Bridge(_) => Shape::Bridge,
            Self::Direct(_) => Shape::Direct,
        }
    }

    /// Code address of the entry point, for identity comparisons.
    #[must_use]
    pub fn addr(self) -> usize {
        match self {
            Self::Bridge(f) => f as usize,
            Self::Direct(f) => f as usize,
        }
    }
}

/// Modules searched during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleSlot {
    /// The process's main executable.
    Main,
    /// The named controls plugin module.
    Controls,
    /// The module hosting this shim.
    Hosting,
}

impl ModuleSlot {
    /// Search order; earlier slots win.
    pub const PRIORITY: [ModuleSlot; 3] = [Self::Main, Self::Controls, Self::Hosting];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Controls => "controls",
            Self::Hosting => "hosting",
        }
    }
}

/// Panel ids accepted by the panel-scoped exports.
pub const PANEL_ID_RANGE: Range<i32> = 0..256;

/// Optional panel-scoped exports probed next to the main entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelExport {
    BasicSettings,
    NetworkConfig,
    TrendlogList,
}

impl PanelExport {
    pub const ALL: [PanelExport; 3] = [Self::BasicSettings, Self::NetworkConfig, Self::TrendlogList];

    /// Export name in the host binary.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::BasicSettings => "GetDeviceBasicSettings",
            Self::NetworkConfig => "GetDeviceNetworkConfig",
            Self::TrendlogList => "BacnetWebView_GetTrendlogList",
        }
    }

    /// Name under which the bridge re-exports it.
    #[must_use]
    pub const fn entry_name(self) -> &'static str {
        match self {
            Self::BasicSettings => "T3Bridge_GetDeviceBasicSettings",
            Self::NetworkConfig => "T3Bridge_GetDeviceNetworkConfig",
            Self::TrendlogList => "T3Bridge_GetTrendlogList",
        }
    }
}

/// Panel exports found in the target's module. Missing entries are normal on
/// older host builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxiliaryExports {
    pub basic_settings: Option<PanelFn>,
    pub network_config: Option<PanelFn>,
    pub trendlog_list: Option<PanelFn>,
}

impl AuxiliaryExports {
    #[must_use]
    pub fn get(&self, export: PanelExport) -> Option<PanelFn> {
        match export {
            PanelExport::BasicSettings => self.basic_settings,
            PanelExport::NetworkConfig => self.network_config,
            PanelExport::TrendlogList => self.trendlog_list,
        }
    }

    pub fn set(&mut self, export: PanelExport, f: PanelFn) {
        let slot = match export {
            PanelExport::BasicSettings => &mut self.basic_settings,
            PanelExport::NetworkConfig => &mut self.network_config,
            PanelExport::TrendlogList => &mut self.trendlog_list,
        };
        *slot = Some(f);
    }

    /// Exports that were found, in [`PanelExport::ALL`] order.
    #[must_use]
    pub fn available(&self) -> Vec<PanelExport> {
        PanelExport::ALL
            .into_iter()
            .filter(|export| self.get(*export).is_some())
            .collect()
    }
}

/// The process-wide resolution result.
#[derive(Debug, Clone)]
pub struct Target {
    pub entry: TargetFn,
    pub symbol: &'static str,
    pub module: ModuleSlot,
    /// Human-readable module identity (file name or path) as reported by the
    /// module source.
    pub module_label: String,
    pub auxiliary: AuxiliaryExports,
}

impl Target {
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.entry.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn panel_stub(_: c_int, _: *mut c_char, _: c_int) -> c_int {
        0
    }

    #[test]
    fn priority_starts_with_main_and_ends_with_hosting() {
        assert_eq!(ModuleSlot::PRIORITY[0], ModuleSlot::Main);
        assert_eq!(ModuleSlot::PRIORITY[2], ModuleSlot::Hosting);
    }

    #[test]
    fn auxiliary_exports_report_only_found_entries() {
        let mut aux = AuxiliaryExports::default();
        assert!(aux.available().is_empty());
        aux.set(PanelExport::NetworkConfig, panel_stub);
        assert_eq!(aux.available(), vec![PanelExport::NetworkConfig]);
        assert!(aux.get(PanelExport::BasicSettings).is_none());
    }

    #[test]
    fn panel_range_excludes_negative_and_256() {
        assert!(PANEL_ID_RANGE.contains(&0));
        assert!(PANEL_ID_RANGE.contains(&255));
        assert!(!PANEL_ID_RANGE.contains(&-1));
        assert!(!PANEL_ID_RANGE.contains(&256));
        for export in PanelExport::ALL {
            assert_ne!(export.symbol(), export.entry_name());
        }
    }

    #[test]
    fn shape_names_are_stable() {
        assert_eq!(Shape::Bridge.as_str(), "bridge");
        assert_eq!(serde_json::to_string(&Shape::Direct).unwrap(), "\"direct\"");
        assert_eq!(
            serde_json::to_string(&PanelExport::TrendlogList).unwrap(),
            "\"trendlog_list\""
        );
    }
}
