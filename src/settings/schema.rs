//! Settings schema definitions for fsmc configuration.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.

use serde::{Deserialize, Serialize};

use crate::input::SAMPLE_MANUAL;

/// Root settings structure.
///
/// Loaded from `~/.fsmc/settings.toml` with environment variable interpolation support.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FsmcSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Compiler service connection
    pub backend: BackendSettings,

    /// Manual input defaults
    pub input: InputSettings,

    /// Where and how results are written
    pub output: OutputSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// FSM compiler service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the compiler service (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request timeout in seconds (0 = wait indefinitely)
    pub timeout_secs: u64,
}

/// Manual input defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Text pre-filled in the manual text area
    pub initial_text: String,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Write the DOT source of every successful compile to this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_path: Option<String>,

    /// Output format: "text" | "json"
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for FsmcSettings {
    fn default() -> Self {
        Self {
            version: 1,
            backend: BackendSettings::default(),
            input: InputSettings::default(),
            output: OutputSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 60,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            initial_text: SAMPLE_MANUAL.to_string(),
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
