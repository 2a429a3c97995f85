//! Configuration management for database and application settings.

/// `SQLite` connection and table creation
pub mod database;

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::entities::CategoryKind;

/// Top-level application configuration, loaded from a TOML file.
#[derive(Deserialize, Debug, Default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` in the environment takes precedence
    pub database_url: Option<String>,
    /// Username promoted to the admin role at startup
    pub admin_username: Option<String>,
    /// Category names the UI layer offers out of the box
    #[serde(default)]
    pub default_categories: Vec<CategoryConfig>,
}

/// A suggested category entry from the config file.
#[derive(Deserialize, Debug, Clone)]
pub struct CategoryConfig {
    pub name: String,
    pub kind: CategoryKind,
}

impl AppConfig {
    /// Resolves the database URL: environment variable first, then the
    /// config file, then a local `SQLite` file.
    #[must_use]
    pub fn resolved_database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| "sqlite://data/couplet.sqlite?mode=rwc".to_string())
    }
}

/// Loads the application configuration from a TOML file.
///
/// A missing file is not an error: every setting has a default, so the
/// crate runs unconfigured (the original loaded the same values from an
/// optional `.env`).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);

    if !path_ref.exists() {
        tracing::debug!("No config file at {:?}, using defaults", path_ref);
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path_ref:?}: {e}"),
    })?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config("does/not/exist.toml").unwrap();
        assert!(config.database_url.is_none());
        assert!(config.admin_username.is_none());
        assert!(config.default_categories.is_empty());
    }

    #[test]
    fn test_parse_config_contents() {
        let config: AppConfig = toml::from_str(
            r#"
            database_url = "sqlite://tmp/test.sqlite"
            admin_username = "admin"

            [[default_categories]]
            name = "Housing"
            kind = "expense"

            [[default_categories]]
            name = "Salary"
            kind = "income"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://tmp/test.sqlite")
        );
        assert_eq!(config.admin_username.as_deref(), Some("admin"));
        assert_eq!(config.default_categories.len(), 2);
        assert_eq!(config.default_categories[0].name, "Housing");
        assert_eq!(config.default_categories[0].kind, CategoryKind::Expense);
        assert_eq!(config.default_categories[1].kind, CategoryKind::Income);
    }
}
