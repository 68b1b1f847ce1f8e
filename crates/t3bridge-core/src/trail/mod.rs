//! Append-only diagnostic trail.
//!
//! Resolution misses are the main field signal for host/shim version
//! mismatches, so every probe and every degraded call is written here. The
//! trail lives beside the host executable:
//!
//! ```text
//! <exe_dir>/T3WebLog/<YYYY-MM>/<MMDD>/T3_BridgeResolver_<MMDD>_<HHhh>.txt
//! ```
//!
//! where `HHhh` names the four-hour UTC block. Each entry is one complete line,
//! written with a single append to a freshly opened file. Nothing here ever
//! reports failure to a caller of the bridge: errors are counted and dropped.

pub mod clock;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::action::action_name;
use crate::config::TrailMode;
use crate::target::{ModuleSlot, PanelExport, Shape};
use clock::UtcStamp;

/// Directory created beside the host executable.
pub const TRAIL_DIR_NAME: &str = "T3WebLog";
/// File name stem for resolver entries.
pub const TRAIL_FILE_STEM: &str = "T3_BridgeResolver";

/// Result of probing one symbol in one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Hit,
    Miss,
    /// Found, but unusable (reason attached).
    Rejected(&'static str),
}

impl ProbeVerdict {
    fn describe(self) -> String {
        match self {
            Self::Hit => "hit".to_string(),
            Self::Miss => "miss".to_string(),
            Self::Rejected(reason) => format!("rejected: {reason}"),
        }
    }
}

/// Everything the bridge records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailEvent<'a> {
    Initialize {
        resolved: bool,
    },
    PassStarted {
        pass: u64,
        forced: bool,
    },
    ModuleUnavailable {
        module: ModuleSlot,
        reason: &'a str,
    },
    Probe {
        module: ModuleSlot,
        label: &'a str,
        symbol: &'a str,
        shape: Shape,
        verdict: ProbeVerdict,
    },
    AuxiliaryProbe {
        module: ModuleSlot,
        export: PanelExport,
        found: bool,
    },
    Resolved {
        module: ModuleSlot,
        label: &'a str,
        symbol: &'a str,
        shape: Shape,
    },
    Failed {
        probes: usize,
    },
    ForwardUnavailable {
        entry: &'a str,
        action: i32,
    },
    ArgumentRejected {
        entry: &'a str,
        action: i32,
        capacity: i32,
    },
    PanelUnavailable {
        entry: &'a str,
        panel_id: i32,
    },
    PanelRejected {
        entry: &'a str,
        panel_id: i32,
        capacity: i32,
    },
    PanicCaught {
        entry: &'a str,
    },
    ConfigFallback {
        detail: &'a str,
    },
}

impl TrailEvent<'_> {
    /// Short event tag used in both renderings.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::PassStarted { .. } => "pass_started",
            Self::ModuleUnavailable { .. } => "module_unavailable",
            Self::Probe { .. } => "probe",
            Self::AuxiliaryProbe { .. } => "auxiliary_probe",
            Self::Resolved { .. } => "resolved",
            Self::Failed { .. } => "failed",
            Self::ForwardUnavailable { .. } => "forward_unavailable",
            Self::ArgumentRejected { .. } => "argument_rejected",
            Self::PanelUnavailable { .. } => "panel_unavailable",
            Self::PanelRejected { .. } => "panel_rejected",
            Self::PanicCaught { .. } => "panic_caught",
            Self::ConfigFallback { .. } => "config_fallback",
        }
    }

    /// Ordered key/value fields for rendering.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        match *self {
            Self::Initialize { resolved } => vec![("resolved", resolved.into())],
            Self::PassStarted { pass, forced } => {
                vec![("pass", pass.into()), ("forced", forced.into())]
            }
            Self::ModuleUnavailable { module, reason } => vec![
                ("module", module.as_str().into()),
                ("reason", reason.into()),
            ],
            Self::Probe {
                module,
                label,
                symbol,
                shape,
                verdict,
            } => vec![
                ("module", module.as_str().into()),
                ("label", label.into()),
                ("symbol", symbol.into()),
                ("shape", shape.as_str().into()),
                ("result", verdict.describe().into()),
            ],
            Self::AuxiliaryProbe {
                module,
                export,
                found,
            } => vec![
                ("module", module.as_str().into()),
                ("symbol", export.symbol().into()),
                ("found", found.into()),
            ],
            Self::Resolved {
                module,
                label,
                symbol,
                shape,
            } => vec![
                ("module", module.as_str().into()),
                ("label", label.into()),
                ("symbol", symbol.into()),
                ("shape", shape.as_str().into()),
            ],
            Self::Failed { probes } => vec![("probes", probes.into())],
            Self::ForwardUnavailable { entry, action } => action_fields(entry, action),
            Self::ArgumentRejected {
                entry,
                action,
                capacity,
            } => {
                let mut fields = action_fields(entry, action);
                fields.push(("capacity", capacity.into()));
                fields
            }
            Self::PanelUnavailable { entry, panel_id } => {
                vec![("entry", entry.into()), ("panel_id", panel_id.into())]
            }
            Self::PanelRejected {
                entry,
                panel_id,
                capacity,
            } => vec![
                ("entry", entry.into()),
                ("panel_id", panel_id.into()),
                ("capacity", capacity.into()),
            ],
            Self::PanicCaught { entry } => vec![("entry", entry.into())],
            Self::ConfigFallback { detail } => vec![("detail", detail.into())],
        }
    }
}

fn action_fields(entry: &str, action: i32) -> Vec<(&'static str, Value)> {
    let mut fields = vec![("entry", entry.into()), ("action", action.into())];
    if let Some(name) = action_name(action) {
        fields.push(("action_name", name.into()));
    }
    fields
}

/// Render `event` as a single line (including the trailing newline).
#[must_use]
pub fn render_line(mode: TrailMode, stamp: &UtcStamp, event: &TrailEvent<'_>) -> String {
    match mode {
        TrailMode::Jsonl => {
            let mut obj = Map::new();
            obj.insert("timestamp".into(), stamp.iso8601().into());
            obj.insert("event".into(), event.kind().into());
            for (key, value) in event.fields() {
                obj.insert(key.into(), value);
            }
            let mut line = Value::Object(obj).to_string();
            line.push('\n');
            line
        }
        TrailMode::Text | TrailMode::Off => {
            let mut line = format!("{} [{}]", stamp.iso8601(), event.kind());
            for (key, value) in event.fields() {
                match value {
                    Value::String(s) => line.push_str(&format!(" {key}={s}")),
                    other => line.push_str(&format!(" {key}={other}")),
                }
            }
            line.push('\n');
            line
        }
    }
}

/// Sink for trail events.
pub trait ProbeObserver: Send + Sync {
    fn record(&self, event: &TrailEvent<'_>);
}

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("trail location unknown: {0}")]
    Unlocated(String),
    #[error("trail io: {0}")]
    Io(#[from] std::io::Error),
}

/// File-backed trail rooted at a `T3WebLog` directory.
#[derive(Debug)]
pub struct DiagnosticTrail {
    mode: TrailMode,
    root: Result<PathBuf, String>,
    written: AtomicU64,
    failures: AtomicU64,
}

impl DiagnosticTrail {
    /// Trail beside the running executable.
    #[must_use]
    pub fn beside_executable(mode: TrailMode) -> Self {
        let root = std::env::current_exe()
            .map_err(|e| e.to_string())
            .and_then(|exe| {
                exe.parent()
                    .map(|dir| dir.join(TRAIL_DIR_NAME))
                    .ok_or_else(|| format!("{} has no parent directory", exe.display()))
            });
        Self {
            mode,
            root,
            written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Trail rooted at an explicit `T3WebLog` directory.
    #[must_use]
    pub fn at(root: impl Into<PathBuf>, mode: TrailMode) -> Self {
        Self {
            mode,
            root: Ok(root.into()),
            written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn mode(&self) -> TrailMode {
        self.mode
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_ref().ok().map(PathBuf::as_path)
    }

    /// Entries successfully appended.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Entries dropped because the trail could not be written.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// File that receives entries stamped `stamp`.
    #[must_use]
    pub fn file_for(root: &Path, stamp: &UtcStamp) -> PathBuf {
        let (start, end) = stamp.four_hour_bucket();
        root.join(format!("{:04}-{:02}", stamp.year, stamp.month))
            .join(format!("{:02}{:02}", stamp.month, stamp.day))
            .join(format!(
                "{TRAIL_FILE_STEM}_{:02}{:02}_{start:02}{end:02}.txt",
                stamp.month, stamp.day
            ))
    }

    /// Append one entry. `Ok` when the mode is `Off`.
    pub fn append(&self, event: &TrailEvent<'_>) -> Result<(), TrailError> {
        if !self.mode.enabled() {
            return Ok(());
        }
        let root = self.root.as_ref().map_err(|e| TrailError::Unlocated(e.clone()))?;
        let stamp = UtcStamp::now();
        let path = Self::file_for(root, &stamp);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let line = render_line(self.mode, &stamp, event);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl ProbeObserver for DiagnosticTrail {
    fn record(&self, event: &TrailEvent<'_>) {
        match self.append(event) {
            Ok(()) if self.mode.enabled() => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Ok(()) => {}
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrail;

impl ProbeObserver for NullTrail {
    fn record(&self, _event: &TrailEvent<'_>) {}
}

/// Keeps rendered text lines in memory. Used by tests and tooling that want to
/// inspect what the resolver did.
#[derive(Debug, Default)]
pub struct MemoryTrail {
    lines: Mutex<Vec<String>>,
}

impl MemoryTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Lines whose event tag equals `kind`.
    #[must_use]
    pub fn lines_of(&self, kind: &str) -> Vec<String> {
        let tag = format!("[{kind}]");
        self.lines
            .lock()
            .iter()
            .filter(|line| line.contains(&tag))
            .cloned()
            .collect()
    }
}

impl ProbeObserver for MemoryTrail {
    fn record(&self, event: &TrailEvent<'_>) {
        let line = render_line(TrailMode::Text, &UtcStamp::now(), event);
        self.lines.lock().push(line.trim_end().to_string());
    }
}
