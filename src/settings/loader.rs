//! Reading and writing `settings.toml`.
//!
//! The file is kept as written (`$VAR` references intact) and a resolved copy
//! is served to callers. Edits go through [`SettingsManager::set_value`], which
//! changes the raw copy, writes it back atomically and re-resolves.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tokio::sync::RwLock;

use super::schema::FsmcSettings;

/// Written on first run so users have something to edit.
const TEMPLATE: &str = include_str!("template.toml");

/// `~/.fsmc/settings.toml`, or `./.fsmc/settings.toml` without a home directory.
pub fn settings_path() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(".fsmc").join("settings.toml")
}

struct Loaded {
    /// As found on disk
    raw: FsmcSettings,
    /// `raw` with environment references substituted
    resolved: FsmcSettings,
}

impl Loaded {
    fn new(raw: FsmcSettings) -> Self {
        let resolved = interpolate(raw.clone());
        Self { raw, resolved }
    }
}

/// Owns one settings file.
pub struct SettingsManager {
    path: PathBuf,
    loaded: RwLock<Loaded>,
}

impl SettingsManager {
    /// Load the default settings file.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Load `path`. A missing file yields defaults; a malformed one is an error.
    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = read_settings(&path).await?;

        Ok(Self {
            loaded: RwLock::new(Loaded::new(raw)),
            path,
        })
    }

    /// Settings with environment references resolved.
    pub async fn get(&self) -> FsmcSettings {
        self.loaded.read().await.resolved.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a setting by dotted key, e.g. `backend.url`.
    ///
    /// Optional settings that are unset read as `null`.
    pub async fn get_value(&self, key: &str) -> Result<Value> {
        let pointer = json_pointer(key);
        if pointer.is_empty() || known_settings()?.pointer(&pointer).is_none() {
            return Err(anyhow!("Setting '{}' not found", key));
        }

        let tree = serde_json::to_value(&self.loaded.read().await.resolved)?;
        Ok(tree.pointer(&pointer).cloned().unwrap_or(Value::Null))
    }

    /// Change a setting by dotted key and persist the file.
    ///
    /// Only existing settings can be changed, one value at a time, and the
    /// value must fit the setting's type. `null` unsets an optional setting.
    pub async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let pointer = json_pointer(key);
        match known_settings()?.pointer(&pointer) {
            _ if pointer.is_empty() => return Err(anyhow!("Empty setting key")),
            None => return Err(anyhow!("Setting '{}' not found", key)),
            Some(Value::Object(_)) => {
                return Err(anyhow!("'{}' is a section; set its keys one by one", key))
            }
            Some(_) => {}
        }

        let mut loaded = self.loaded.write().await;

        let mut tree = serde_json::to_value(&loaded.raw)?;
        let (section, leaf) = match pointer.rsplit_once('/') {
            Some((section, leaf)) => (section, leaf),
            None => ("", pointer.as_str()),
        };
        tree.pointer_mut(section)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| anyhow!("Setting section for '{}' not found", key))?
            .insert(leaf.to_string(), value);

        let updated: FsmcSettings = serde_json::from_value(tree)
            .with_context(|| format!("Invalid value for setting '{}'", key))?;

        write_atomically(&self.path, &updated).await?;
        *loaded = Loaded::new(updated);
        tracing::debug!(key, "Setting updated");
        Ok(())
    }

    /// Write the commented template if the file does not exist yet.
    ///
    /// Returns whether a file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(false);
        }

        ensure_parent(&self.path).await?;
        tokio::fs::write(&self.path, TEMPLATE)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "Created settings file from template");
        Ok(true)
    }
}

async fn read_settings(path: &Path) -> Result<FsmcSettings> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(FsmcSettings::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let settings = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

/// Temp file + rename so a crash never leaves a truncated file behind.
async fn write_atomically(path: &Path, settings: &FsmcSettings) -> Result<()> {
    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;

    ensure_parent(path).await?;
    let staging = path.with_extension("toml.tmp");
    tokio::fs::write(&staging, contents).await?;
    tokio::fs::rename(&staging, path).await?;

    tracing::info!(path = %path.display(), "Saved settings");
    Ok(())
}

async fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `backend.url` -> `/backend/url`
fn json_pointer(key: &str) -> String {
    key.split('.')
        .filter(|part| !part.is_empty())
        .fold(String::new(), |mut pointer, part| {
            pointer.push('/');
            pointer.push_str(part);
            pointer
        })
}

/// Shape of every setting, with optional ones filled in so they show up.
fn known_settings() -> Result<Value> {
    let mut full = FsmcSettings::default();
    full.backend.url.get_or_insert_with(String::new);
    full.output.dot_path.get_or_insert_with(String::new);
    Ok(serde_json::to_value(full)?)
}

/// Substitute `$NAME` / `${NAME}` values. A reference to a variable that is
/// unset or empty leaves the setting unset.
fn interpolate(mut settings: FsmcSettings) -> FsmcSettings {
    for field in [&mut settings.backend.url, &mut settings.output.dot_path] {
        let Some(name) = field.as_deref().and_then(env_reference) else {
            continue;
        };
        let value = std::env::var(name).ok().filter(|v| !v.is_empty());
        if value.is_none() {
            tracing::debug!(variable = name, "Settings reference an unset variable");
        }
        *field = value;
    }
    settings
}

/// Variable named by a `$NAME` or `${NAME}` value; `None` for plain strings.
fn env_reference(value: &str) -> Option<&str> {
    let reference = value.trim().strip_prefix('$')?;
    let name = match reference.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => reference,
    };
    (!name.is_empty()).then_some(name)
}

/// First non-empty value among the setting and the listed environment variables.
pub fn setting_or_env(setting: Option<&str>, env_vars: &[&str]) -> Option<String> {
    setting
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env_vars
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|v| !v.is_empty())
        })
}
