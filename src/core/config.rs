use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::crypto::keyring::Keyring;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: RunMode,
}

/// Execution mode of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl RunMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(RunMode::Development),
            "production" | "prod" => Some(RunMode::Production),
            _ => None,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EncryptionConfig {
    /// Key used for new ciphertext, `k1.<algorithm>.<base64>` or 64 hex chars.
    #[serde(default)]
    pub key: String,
    /// Retired keys that may still appear in stored ciphertext.
    #[serde(default)]
    pub decryption_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` or `console`; unset picks console in development, json in production.
    pub format: Option<String>,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
            console: default_console(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "file:./dev.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30 // seconds
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from an optional TOML file, then apply `.env` and
    /// environment overrides and validate the result.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };

        dotenvy::dotenv().ok();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML file without validating it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Overlay values from the environment. `lookup` is injected so tests do
    /// not have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }

        // PRISMA_FIELD_* names are read when the plain names are unset or blank
        let first_of = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        };

        if let Some(key) = first_of(["FIELD_ENCRYPTION_KEY", "PRISMA_FIELD_ENCRYPTION_KEY"]) {
            self.encryption.key = key;
        }

        if let Some(keys) = first_of(["FIELD_DECRYPTION_KEYS", "PRISMA_FIELD_DECRYPTION_KEYS"]) {
            self.encryption.decryption_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(mode) = lookup("APP_ENV") {
            self.app.mode = match RunMode::parse(&mode) {
                Some(mode) => mode,
                None => bail!("Invalid APP_ENV '{}'. Must be one of: development, production", mode),
            };
        }

        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .context(format!("Invalid PORT '{}'", port))?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Log format after applying the run-mode default.
    pub fn log_format(&self) -> &str {
        match (&self.logging.format, self.app.mode) {
            (Some(format), _) => format.as_str(),
            (None, RunMode::Development) => "console",
            (None, RunMode::Production) => "json",
        }
    }

    /// Build the keyring described by the encryption section.
    pub fn keyring(&self) -> Result<Keyring> {
        Keyring::from_strings(&self.encryption.key, &self.encryption.decryption_keys)
            .context("Invalid field encryption key configuration")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.database.url.trim().is_empty() {
            bail!("database url must not be empty");
        }

        if self.database.max_connections == 0 {
            bail!("max_connections must be greater than 0");
        }

        if self.database.connection_timeout == 0 {
            bail!("connection_timeout must be greater than 0");
        }

        if self.encryption.key.trim().is_empty() {
            bail!("Field encryption key is missing. Set FIELD_ENCRYPTION_KEY or encryption.key (run `keygen` to create one)");
        }

        self.keyring()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.log_format()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.log_format()
            );
        }

        Ok(())
    }
}

/// Default config file location, overridable by the first CLI argument.
pub fn config_path_from_args(args: &[String]) -> PathBuf {
    if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "file:./dev.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.app.mode, RunMode::Development);
        assert_eq!(config.log_format(), "console");
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [app]
            mode = "production"

            [server]
            port = 8080

            [database]
            url = "file:/var/lib/users.db"
            max_connections = 4

            [encryption]
            key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
            "#,
        )
        .unwrap();

        assert_eq!(config.app.mode, RunMode::Production);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "file:/var/lib/users.db");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.log_format(), "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("DATABASE_URL", "file:./other.db"),
                ("FIELD_ENCRYPTION_KEY", TEST_KEY),
                ("FIELD_DECRYPTION_KEYS", " a , ,b"),
                ("APP_ENV", "prod"),
                ("PORT", "9000"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.database.url, "file:./other.db");
        assert_eq!(config.encryption.key, TEST_KEY);
        assert_eq!(config.encryption.decryption_keys, vec!["a", "b"]);
        assert_eq!(config.app.mode, RunMode::Production);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_prisma_key_names_are_accepted() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("PRISMA_FIELD_ENCRYPTION_KEY", TEST_KEY),
                ("PRISMA_FIELD_DECRYPTION_KEYS", "old1,old2"),
            ]))
            .unwrap();
        assert_eq!(config.encryption.key, TEST_KEY);
        assert_eq!(config.encryption.decryption_keys, vec!["old1", "old2"]);

        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("FIELD_ENCRYPTION_KEY", TEST_KEY),
                ("PRISMA_FIELD_ENCRYPTION_KEY", "ignored"),
            ]))
            .unwrap();
        assert_eq!(config.encryption.key, TEST_KEY);

        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("FIELD_ENCRYPTION_KEY", ""),
                ("PRISMA_FIELD_ENCRYPTION_KEY", TEST_KEY),
            ]))
            .unwrap();
        assert_eq!(config.encryption.key, TEST_KEY);
    }

    #[test]
    fn test_invalid_app_env() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(env(&[("APP_ENV", "staging")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("FIELD_ENCRYPTION_KEY"));
    }

    #[test]
    fn test_malformed_key_fails_validation() {
        let mut config = Config::default();
        config.encryption.key = "not-a-key".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.encryption.key = TEST_KEY.to_string();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_path_from_args() {
        let args = vec!["server".to_string()];
        assert_eq!(config_path_from_args(&args), PathBuf::from("config.toml"));

        let args = vec!["server".to_string(), "custom.toml".to_string()];
        assert_eq!(config_path_from_args(&args), PathBuf::from("custom.toml"));
    }
}
