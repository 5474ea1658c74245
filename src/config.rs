//! Connection settings.
//!
//! Loaded with priority: environment (`CONTENTQL__*`) > config file >
//! defaults. The CLI applies its own flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{DriverError, Result};

const CONFIG_FILE: &str = "contentql.toml";

fn default_adapter() -> String {
    "default".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connection() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Key of the connection in the `connections` table.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    /// Adapter alias or type name resolved through the registry.
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Table prefix; the adapter's default applies when unset.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: String::new(),
            public_key: String::new(),
            private_key: String::new(),
            adapter: default_adapter(),
            prefix: None,
            timeout_secs: default_timeout(),
        }
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = adapter.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_connection")]
    pub default: String,
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            default: default_connection(),
            connections: HashMap::new(),
        }
    }
}

impl DriverConfig {
    /// Config files looked up when no explicit path is given, lowest
    /// priority first.
    #[must_use]
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/contentql").join(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("contentql").join(CONFIG_FILE));
        }
        paths.push(PathBuf::from(".").join(CONFIG_FILE));
        paths
    }

    /// Loads `path` (required) or every existing file of
    /// [`search_paths`](Self::search_paths), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                for candidate in Self::search_paths() {
                    if candidate.exists() {
                        debug!(path = %candidate.display(), "loading config file");
                        builder = builder.add_source(File::from(candidate.as_path()));
                    }
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("CONTENTQL").separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config.named())
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config.named())
    }

    fn named(mut self) -> Self {
        for (name, connection) in &mut self.connections {
            connection.name.clone_from(name);
        }
        self
    }

    /// The named connection, or the default one.
    pub fn connection(&self, name: Option<&str>) -> Result<ConnectionConfig> {
        let name = name.unwrap_or(&self.default);
        self.connections.get(name).cloned().ok_or_else(|| {
            DriverError::configuration(format!("Database connection [{name}] not configured."))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default = "site"

[connections.site]
base_url = "https://api.example.com/v1/"
public_key = "pub"
private_key = "secret"
adapter = "entry"

[connections.shop]
base_url = "https://api.example.com/v1/"
adapter = "customer"
prefix = ""
timeout_secs = 5
"#;

    #[test]
    fn test_from_toml_str() {
        let config = DriverConfig::from_toml_str(SAMPLE).unwrap();
        let site = config.connection(None).unwrap();
        assert_eq!(site.name, "site");
        assert_eq!(site.adapter, "entry");
        assert_eq!(site.prefix, None);
        assert_eq!(site.timeout_secs, 30);

        let shop = config.connection(Some("shop")).unwrap();
        assert_eq!(shop.prefix.as_deref(), Some(""));
        assert_eq!(shop.timeout_secs, 5);
    }

    #[test]
    fn test_missing_connection() {
        let config = DriverConfig::from_toml_str(SAMPLE).unwrap();
        let err = config.connection(Some("archive")).unwrap_err();
        assert_eq!(err.to_string(), "Database connection [archive] not configured.");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contentql.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = DriverConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default, "site");
        assert_eq!(config.connections.len(), 2);
        assert_eq!(config.connection(Some("site")).unwrap().public_key, "pub");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = DriverConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let connection = ConnectionConfig::new("x").with_adapter("page").with_prefix("p_");
        assert_eq!(connection.adapter, "page");
        assert_eq!(connection.prefix.as_deref(), Some("p_"));
        assert_eq!(DriverConfig::default().default, "default");
    }
}
