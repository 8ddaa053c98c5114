//! TOML-based settings for fsmc.
//!
//! Settings live in `~/.fsmc/settings.toml` (override with `--settings` or
//! `$FSMC_SETTINGS`). `backend.url` and `output.dot_path` may be written as
//! `$VAR` / `${VAR}`; they are resolved from the environment when read, and an
//! unset variable leaves the setting unset. The file itself keeps the reference.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fsmc_lib::settings::{setting_or_env, SettingsManager, BACKEND_URL_ENV};
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//!
//! let url = setting_or_env(settings.backend.url.as_deref(), &[BACKEND_URL_ENV]);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{setting_or_env, settings_path, SettingsManager};
pub use schema::{FsmcSettings, OutputFormat};

/// Environment variable consulted when no backend URL is configured
pub const BACKEND_URL_ENV: &str = "FSMC_BACKEND_URL";
