//! Configuration
//!
//! The app config is one TOML file holding the backend coordinates and
//! the deploy-time member roster. Looked up in the platform config
//! directory, overridable with the `FAMSTAR_CONFIG` environment
//! variable.
//!
//! ```toml
//! [backend]
//! url = "https://project.supabase.co"
//! anon_key = "..."
//!
//! [[members]]
//! username = "ana"
//! name = "Ana"
//! icon = "ana.png"
//! avatar = "ana.gif"
//! email = "ana@famstar.local"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::members::{Member, MemberDirectory};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "FAMSTAR_CONFIG";

/// Errors loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config at {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or misses required fields.
    #[error("cannot parse config at {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The roster is empty; the app has nobody to show.
    #[error("config at {path} declares no members")]
    EmptyRoster {
        /// Path that failed.
        path: PathBuf,
    },
}

/// Backend service coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Service base URL, e.g. `https://project.supabase.co`.
    pub url: String,
    /// Public (anon) API key. Safe to ship to clients.
    pub anon_key: String,
}

/// The parsed application configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend service coordinates.
    pub backend: BackendSettings,
    /// The deploy-time member roster.
    pub members: Vec<Member>,
}

impl AppConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.members.is_empty() {
            return Err(ConfigError::EmptyRoster {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// Build the member directory from the roster.
    pub fn directory(&self) -> MemberDirectory {
        MemberDirectory::new(self.members.clone())
    }
}

/// The default config file location:
/// `$XDG_CONFIG_HOME/famstar/config.toml` (or the platform
/// equivalent), falling back to `./famstar.toml` when no config
/// directory is known.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("famstar").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("famstar.toml"))
}

/// Load the configuration from `FAMSTAR_CONFIG` or the default path.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    load_config_from_path(&path)
}

/// Load the configuration from an explicit path.
pub fn load_config_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backend]
url = "https://project.supabase.co"
anon_key = "public-key"

[[members]]
username = "ana"
name = "Ana"
icon = "ana.png"
avatar = "ana.gif"
email = "ana@famstar.local"

[[members]]
username = "bruno"
name = "Bruno"
icon = "bruno.png"
avatar = "bruno.gif"
email = "bruno@famstar.local"
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE, Path::new("test.toml")).unwrap();
        assert_eq!(config.backend.url, "https://project.supabase.co");
        assert_eq!(config.members.len(), 2);
        assert_eq!(config.directory().by_username("bruno").unwrap().name, "Bruno");
    }

    #[test]
    fn test_empty_roster_rejected() {
        let text = r#"
[backend]
url = "https://project.supabase.co"
anon_key = "public-key"
members = []
"#;
        let err = AppConfig::from_toml(text, Path::new("test.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRoster { .. }));
    }

    #[test]
    fn test_missing_backend_rejected() {
        let err = AppConfig::from_toml("members = []", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
