//! Configuration management
//!
//! Settings live in `<data dir>/settings.json`:
//! ```json
//! {
//!   "app": { "demoMode": false, ... },
//!   "importProfiles": { "profiles": { "bank": { "mapping": { ... } } } }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::import::CsvMapping;

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Environment variable overriding `app.demoMode`
pub const DEMO_MODE_ENV: &str = "BUDGET_DEMO_MODE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    import_profiles: ImportProfilesContainer,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportProfilesContainer {
    #[serde(default)]
    profiles: HashMap<String, ImportProfile>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// budget-analyzer configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub import_profiles: HashMap<String, ImportProfile>,
}

impl Config {
    /// Load config from the data directory
    ///
    /// Demo mode can be enabled via:
    /// 1. Settings file (`budget demo on`)
    /// 2. Environment variable BUDGET_DEMO_MODE (for CI/testing)
    ///
    /// An unreadable settings file is treated as empty.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(&settings_path(data_dir))?;

        let demo_mode = match std::env::var(DEMO_MODE_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        Ok(Self {
            demo_mode,
            import_profiles: raw.import_profiles.profiles,
        })
    }

    /// Save config to the data directory, preserving settings we don't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = settings_path(data_dir);
        let mut settings = read_settings(&path)?;

        settings.app.demo_mode = self.demo_mode;
        settings.import_profiles.profiles = self.import_profiles.clone();

        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

/// Saved column mapping for a recurring CSV layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProfile {
    pub mapping: CsvMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_currency_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile() -> ImportProfile {
        let mut mapping = CsvMapping::default();
        mapping.date = Some("Posted".to_string());
        mapping.account = Some("Acct".to_string());
        mapping.amount = Some("Amt".to_string());
        ImportProfile {
            mapping,
            default_currency_code: Some("EUR".to_string()),
        }
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.import_profiles.is_empty());
    }

    #[test]
    fn test_save_and_load_profiles() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.import_profiles.insert("bank".to_string(), profile());
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.import_profiles.get("bank"), Some(&profile()));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"app":{"demoMode":false,"theme":"dark"},"plugins":{"x":1}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.import_profiles.insert("bank".to_string(), profile());
        config.save(dir.path()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap()).unwrap();
        assert_eq!(raw["app"]["theme"], "dark");
        assert_eq!(raw["plugins"]["x"], 1);
        assert_eq!(raw["importProfiles"]["profiles"]["bank"]["mapping"]["date"], "Posted");
    }

    #[test]
    fn test_garbage_settings_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.import_profiles.is_empty());
    }
}
