//! TOML-based configuration, narrowed to named database connections.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! url = "${PROD_DB_URL}"
//!
//! [connections.dev]
//! url = "sqlite://./data/dev.db"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::ConnectionConfig;

/// Error type for settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named database connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionSettings>,
}

/// A single named connection entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Connection URL, supports `${ENV_VAR}` expansion.
    pub url: String,
}

impl ConnectionSettings {
    /// Expands `${VAR}` references and parses the resulting URL.
    pub fn resolve(&self) -> Result<ConnectionConfig, SettingsError> {
        let expanded = expand_env_vars(&self.url)?;
        ConnectionConfig::parse(&expanded)
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.display().to_string()));
        }
        let content =
            fs::read_to_string(path).map_err(|e| SettingsError::ReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| SettingsError::ParseError(e.to_string()))
    }

    /// Searches `./sqlstratum.toml`, then `$SQLSTRATUM_CONFIG`, then falls
    /// back to an empty default.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SQLSTRATUM_CONFIG") {
            return Self::from_file(&path);
        }
        let local_config = PathBuf::from("sqlstratum.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }
        Ok(Settings::default())
    }

    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }
}

/// Expands `${VAR}` and `$VAR` references in a string.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_env_var() {
        env::set_var("SQLSTRATUM_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${SQLSTRATUM_TEST_VAR}").unwrap(), "hello");
        env::remove_var("SQLSTRATUM_TEST_VAR");
    }

    #[test]
    fn expands_bare_env_var() {
        env::set_var("SQLSTRATUM_TEST_VAR2", "world");
        assert_eq!(expand_env_vars("$SQLSTRATUM_TEST_VAR2!").unwrap(), "world!");
        env::remove_var("SQLSTRATUM_TEST_VAR2");
    }

    #[test]
    fn missing_env_var_is_an_error() {
        assert!(expand_env_vars("${SQLSTRATUM_NONEXISTENT_VAR_12345}").is_err());
    }

    #[test]
    fn parses_toml_connections() {
        let toml = r#"
[connections.dev]
url = "sqlite://./data/dev.db"
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.connections.len(), 1);
        assert!(settings.connections.contains_key("dev"));
    }

    #[test]
    fn resolves_connection_with_env_expansion() {
        env::set_var("SQLSTRATUM_TEST_URL", "sqlite://:memory:");
        let settings = ConnectionSettings {
            url: "${SQLSTRATUM_TEST_URL}".to_string(),
        };
        let resolved = settings.resolve().unwrap();
        assert_eq!(
            resolved,
            ConnectionConfig::Sqlite {
                path: ":memory:".to_string()
            }
        );
        env::remove_var("SQLSTRATUM_TEST_URL");
    }

    #[test]
    fn unknown_connection_name_is_an_error() {
        let settings = Settings::default();
        assert!(settings.get_connection("missing").is_err());
    }
}
