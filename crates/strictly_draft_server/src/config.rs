//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strictly_draft::{Catalog, PoolConfig, RulesConfig};
use tracing::{debug, info, instrument};

/// Configuration for the draft service.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// JSON file holding the card catalog.
    catalog_path: PathBuf,

    /// Draft rules.
    #[serde(default)]
    rules: RulesConfig,

    /// Pool generation. Drafts use the whole catalog when absent.
    #[serde(default)]
    pool: Option<PoolConfig>,
}

#[instrument]
fn default_db_path() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "strictly_draft.db".to_string())
}

impl ServerConfig {
    /// Creates a configuration with default rules and no pool.
    #[instrument(skip(catalog_path), fields(catalog_path = %catalog_path.as_ref().display()))]
    pub fn new(db_path: String, catalog_path: impl AsRef<Path>) -> Self {
        Self {
            db_path,
            catalog_path: catalog_path.as_ref().to_path_buf(),
            rules: RulesConfig::default(),
            pool: None,
        }
    }

    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config
            .rules
            .validate()
            .map_err(|e| ConfigError::new(format!("Unplayable rules: {}", e)))?;

        info!(db_path = %config.db_path, "Config loaded successfully");
        Ok(config)
    }

    /// Reads the catalog file named by this configuration.
    #[instrument(skip(self), fields(path = %self.catalog_path.display()))]
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        load_catalog(&self.catalog_path)
    }
}

/// Reads a JSON card catalog.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::new(format!("Failed to read catalog: {}", e)))?;
    let catalog = Catalog::from_json(&content)
        .map_err(|e| ConfigError::new(format!("Failed to parse catalog: {}", e)))?;
    info!(cards = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

/// Reads a TOML file holding only draft rules.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_rules(path: impl AsRef<Path>) -> Result<RulesConfig, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::new(format!("Failed to read rules: {}", e)))?;
    let rules: RulesConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::new(format!("Failed to parse rules: {}", e)))?;
    rules
        .validate()
        .map_err(|e| ConfigError::new(format!("Unplayable rules: {}", e)))?;
    Ok(rules)
}

/// Reads a TOML file holding only pool settings.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_pool_config(path: impl AsRef<Path>) -> Result<PoolConfig, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::new(format!("Failed to read pool config: {}", e)))?;
    toml::from_str(&content).map_err(|e| ConfigError::new(format!("Failed to parse pool config: {}", e)))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strictly_draft::UnitClass;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write");
        file
    }

    #[test]
    fn test_config_reads_rules_and_pool() {
        let file = write_temp(
            r#"
            db_path = "draft.db"
            catalog_path = "cards.json"

            [rules]
            points_budget = 12
            reserve_for = "god"

            [[rules.class_caps]]
            class = "god"
            max = 1

            [pool]
            draft_size = 24
            "#,
        );
        let config = ServerConfig::from_file(file.path()).expect("Load failed");
        assert_eq!(config.db_path(), "draft.db");
        assert_eq!(*config.rules().points_budget(), 12);
        assert_eq!(*config.rules().reserve_for(), Some(UnitClass::God));
        assert_eq!(*config.pool().as_ref().unwrap().draft_size(), 24);
    }

    #[test]
    fn test_unplayable_rules_are_rejected() {
        let file = write_temp(
            r#"
            catalog_path = "cards.json"
            [rules]
            die_faces = 1
            "#,
        );
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.message.contains("Unplayable"));
    }

    #[test]
    fn test_missing_file_reports_location() {
        let err = ServerConfig::from_file("/nonexistent/strictly_draft.toml").unwrap_err();
        assert!(err.message.contains("Failed to read"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_catalog_file_loads() {
        let file = write_temp(r#"[{"id": "zeus", "name": "Zeus", "cost": 6, "classes": ["god"]}]"#);
        let catalog = load_catalog(file.path()).expect("Load failed");
        assert_eq!(catalog.len(), 1);
    }
}
