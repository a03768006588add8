// Configuration Storage Service
// Handles config file read/write, version backup and environment overrides

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::detection::DetectorConfig;
use super::training_validator::{DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};

pub const ENV_BATCH_SIZE: &str = "MARATHI_SIEVE_BATCH_SIZE";
pub const ENV_SOURCE_GROUPS: &str = "MARATHI_SIEVE_SOURCE_GROUPS";
pub const ENV_MAX_ITEMS_PER_GROUP: &str = "MARATHI_SIEVE_MAX_ITEMS_PER_GROUP";

const MAX_BACKUPS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub detection: DetectorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            detection: DetectorConfig::default(),
            pipeline: PipelineConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_source_groups")]
    pub source_groups: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items_per_group: usize,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            source_groups: default_source_groups(),
            max_items_per_group: default_max_items(),
            progress_every: default_progress_every(),
            platform: default_platform(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
        }
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_batch_size() -> usize { 100 }
fn default_source_groups() -> Vec<String> {
    ["marathi", "mumbai", "india"].iter().map(|s| s.to_string()).collect()
}
fn default_max_items() -> usize { 1000 }
fn default_progress_every() -> usize { 500 }
fn default_platform() -> String { "reddit".to_string() }
fn default_min_length() -> usize { DEFAULT_MIN_LENGTH }
fn default_max_length() -> usize { DEFAULT_MAX_LENGTH }

impl AppConfig {
    /// Apply `MARATHI_SIEVE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Unparseable values are ignored, keeping the file value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = lookup(ENV_BATCH_SIZE).and_then(|v| v.trim().parse().ok()) {
            self.pipeline.batch_size = n;
        }
        if let Some(groups) = lookup(ENV_SOURCE_GROUPS) {
            let groups: Vec<String> = groups
                .split(',')
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();
            if !groups.is_empty() {
                self.pipeline.source_groups = groups;
            }
        }
        if let Some(n) = lookup(ENV_MAX_ITEMS_PER_GROUP).and_then(|v| v.trim().parse().ok()) {
            self.pipeline.max_items_per_group = n;
        }
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store backed by an explicit file; backups go next to it.
    pub fn from_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("marathi-sieve"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file, defaults when absent
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        // Millisecond stamp so two saves within one second keep distinct backups.
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Names embed the timestamp, so lexical order is age order.
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_store() -> (ConfigStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("marathi_sieve_cfg_{}", uuid::Uuid::new_v4()));
        (ConfigStore::new(dir.clone()), dir)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.batch_size, 100);
        assert_eq!(config.pipeline.source_groups, vec!["marathi", "mumbai", "india"]);
        assert_eq!(config.pipeline.platform, "reddit");
        assert_eq!(config.training.min_length, 10);
        assert_eq!(config.training.max_length, 2048);
        assert!((config.detection.target_weights.script_ratio - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"version":"0.0.1","pipeline":{"batchSize":25}}"#).unwrap();
        assert_eq!(parsed.version, "0.0.1");
        assert_eq!(parsed.pipeline.batch_size, 25);
        assert_eq!(parsed.pipeline.progress_every, 500);
        assert_eq!(parsed.detection, DetectorConfig::default());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let (store, _dir) = temp_store();
        assert_eq!(store.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_load_and_backups() {
        let (store, dir) = temp_store();
        let mut config = AppConfig::default();

        for n in 0..(MAX_BACKUPS + 3) {
            config.pipeline.batch_size = n + 1;
            store.save(&config).unwrap();
        }

        assert_eq!(store.load().unwrap().pipeline.batch_size, MAX_BACKUPS + 3);
        let backups = fs::read_dir(dir.join("backups")).unwrap().count();
        assert!(backups <= MAX_BACKUPS);
        assert!(backups > 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let (store, dir) = temp_store();
        store.ensure_dir().unwrap();
        fs::write(store.config_file(), "{ nope").unwrap();
        let err = store.load().unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BATCH_SIZE, " 42 "),
            (ENV_SOURCE_GROUPS, "pune, nashik ,,"),
            (ENV_MAX_ITEMS_PER_GROUP, "not a number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.pipeline.batch_size, 42);
        assert_eq!(config.pipeline.source_groups, vec!["pune", "nashik"]);
        assert_eq!(config.pipeline.max_items_per_group, 1000);
    }
}
