//! Configuration loading for solr-sync.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/solr-sync/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SyncError;

/// Field whose role/user tokens get colon substitution out of the box.
pub const DEFAULT_ACCESS_CONTROL_FIELD: &str = "allowedRolesAndUsers";

/// Engine connection and indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether indexing talks to the engine at all.
    /// Deployments without a configured engine leave this off.
    #[serde(default)]
    pub active: bool,

    /// Engine host
    #[serde(default = "default_host")]
    pub host: String,

    /// Engine port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base path of the engine's web application (e.g. "/solr")
    #[serde(default = "default_base")]
    pub base: String,

    /// Transport timeout per request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fields holding role/user identifiers; ':' becomes '$' in their values
    #[serde(default = "default_access_control_fields")]
    pub access_control_fields: Vec<String>,

    /// Identifier attribute used when the schema declares no unique key
    #[serde(default = "default_unique_key")]
    pub unique_key_fallback: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8983
}

fn default_base() -> String {
    "/solr".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_access_control_fields() -> Vec<String> {
    vec![DEFAULT_ACCESS_CONTROL_FIELD.to_string()]
}

fn default_unique_key() -> String {
    "id".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active: false,
            host: default_host(),
            port: default_port(),
            base: default_base(),
            timeout_secs: default_timeout_secs(),
            access_control_fields: default_access_control_fields(),
            unique_key_fallback: default_unique_key(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/solr-sync/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SOLR_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SyncError> {
        let config_dir = ProjectDirs::from("", "", "solr-sync")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("active", false)
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("host", default_host())
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("port", default_port() as i64)
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("base", default_base())
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("timeout_secs", default_timeout_secs() as i64)
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("unique_key_fallback", default_unique_key())
            .map_err(|e| SyncError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SyncError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: SOLR_HOST, SOLR_PORT, SOLR_ACTIVE, ...
        builder = builder.add_source(
            Environment::with_prefix("SOLR")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("access_control_fields"),
        );

        let config = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.host.trim().is_empty() {
            return Err(SyncError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(SyncError::Config("port must be > 0".to_string()));
        }
        if !self.base.starts_with('/') {
            return Err(SyncError::Config(format!(
                "base must start with '/', got {:?}",
                self.base
            )));
        }
        Ok(())
    }

    /// Scheme, host and port of the engine, without the base path.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Path of the update handler.
    pub fn update_path(&self) -> String {
        format!("{}/update", self.base.trim_end_matches('/'))
    }

    /// Path serving the raw schema file.
    pub fn schema_path(&self) -> String {
        format!(
            "{}/admin/get-file.jsp?file=schema.xml",
            self.base.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.active);
        assert_eq!(settings.port, 8983);
        assert_eq!(settings.base, "/solr");
        assert_eq!(settings.access_control_fields, vec!["allowedRolesAndUsers"]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_paths() {
        let settings = Settings::default();
        assert_eq!(settings.base_url(), "http://localhost:8983");
        assert_eq!(settings.update_path(), "/solr/update");
        assert_eq!(
            settings.schema_path(),
            "/solr/admin/get-file.jsp?file=schema.xml"
        );
    }

    #[test]
    fn test_trailing_slash_in_base() {
        let settings = Settings {
            base: "/search/".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.update_path(), "/search/update");
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.port = 0;
        assert!(settings.validate().is_err());

        settings.port = 8983;
        settings.base = "solr".to_string();
        assert!(settings.validate().is_err());

        settings.base = "/solr".to_string();
        settings.host = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
active = true
host = "search.internal"
port = 8080
access_control_fields = ["allowedRolesAndUsers", "owners"]
"#
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert!(settings.active);
        assert_eq!(settings.host, "search.internal");
        assert_eq!(settings.port, 8080);
        assert_eq!(
            settings.access_control_fields,
            vec!["allowedRolesAndUsers", "owners"]
        );
        assert_eq!(settings.base, "/solr");
    }

    #[test]
    fn test_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.host, settings.host);
        assert_eq!(decoded.unique_key_fallback, "id");
    }
}
