//! Runtime configuration.
//!
//! Read once from the environment when the process-wide bridge is built:
//! - `T3BRIDGE_TRAIL`: `text` (default), `jsonl`, or `off`.
//! - `T3BRIDGE_CONTROLS_MODULE`: file name of the controls plugin module.
//! - `T3BRIDGE_SELF_MODULE`: file name of this shim. Only consulted where the
//!   platform cannot discover the hosting module from a code address.
//!
//! The trail directory is deliberately absent: it is always derived from the
//! host executable's location.

use serde::Serialize;
use thiserror::Error;

pub const ENV_TRAIL: &str = "T3BRIDGE_TRAIL";
pub const ENV_CONTROLS_MODULE: &str = "T3BRIDGE_CONTROLS_MODULE";
pub const ENV_SELF_MODULE: &str = "T3BRIDGE_SELF_MODULE";

#[cfg(windows)]
pub const DEFAULT_CONTROLS_MODULE: &str = "T3000Controls.dll";
#[cfg(not(windows))]
pub const DEFAULT_CONTROLS_MODULE: &str = "libt3000controls.so";

#[cfg(windows)]
pub const DEFAULT_SELF_MODULE: &str = "t3bridge_abi.dll";
#[cfg(not(windows))]
pub const DEFAULT_SELF_MODULE: &str = "libt3bridge_abi.so";

/// How trail entries are rendered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailMode {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per line.
    Jsonl,
    /// Nothing is written.
    Off,
}

impl TrailMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "default" | "on" => Ok(Self::Text),
            "jsonl" | "json" => Ok(Self::Jsonl),
            "off" | "none" | "disabled" => Ok(Self::Off),
            _ => Err(ConfigError::InvalidValue {
                variable: ENV_TRAIL,
                value: s.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
            Self::Off => "off",
        }
    }

    #[must_use]
    pub const fn enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{variable}: unrecognized value {value:?}")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
    #[error("{variable}: module name must not be empty")]
    EmptyModuleName { variable: &'static str },
}

/// Effective bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub trail_mode: TrailMode,
    pub controls_module: String,
    pub self_module: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            trail_mode: TrailMode::default(),
            controls_module: DEFAULT_CONTROLS_MODULE.to_string(),
            self_module: DEFAULT_SELF_MODULE.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Build from the process environment.
    ///
    /// Malformed values never fail the load; they fall back to the default and
    /// are returned alongside so the caller can put them on the trail.
    #[must_use]
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut rejected = Vec::new();

        if let Some(raw) = lookup(ENV_TRAIL) {
            match TrailMode::parse(&raw) {
                Ok(mode) => config.trail_mode = mode,
                Err(err) => rejected.push(err),
            }
        }
        for (variable, slot) in [
            (ENV_CONTROLS_MODULE, &mut config.controls_module),
            (ENV_SELF_MODULE, &mut config.self_module),
        ] {
            if let Some(raw) = lookup(variable) {
                match module_name(variable, &raw) {
                    Ok(name) => *slot = name,
                    Err(err) => rejected.push(err),
                }
            }
        }

        (config, rejected)
    }
}

fn module_name(variable: &'static str, raw: &str) -> Result<String, ConfigError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyModuleName { variable });
    }
    Ok(name.to_string())
}
