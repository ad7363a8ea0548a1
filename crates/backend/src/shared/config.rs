use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Фоновая проверка связи с устройствами
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectivityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron-выражение с секундами: "sec min hour dom month dow"
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
        }
    }
}

impl ConnectivityConfig {
    pub fn parsed_schedule(&self) -> anyhow::Result<cron::Schedule> {
        cron::Schedule::from_str(&self.schedule)
            .map_err(|e| anyhow::anyhow!("Invalid connectivity schedule '{}': {}", self.schedule, e))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_batch_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 0 * * * *".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/mps.db"

[server]
host = "0.0.0.0"
port = 3000

[import]
batch_size = 100

[connectivity]
enabled = true
schedule = "0 0 * * * *"
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable
/// 2. Embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");
            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            }
            tracing::warn!("config.toml not found at: {}", config_path.display());
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.import.batch_size == 0 {
        anyhow::bail!("import.batch_size must be greater than zero");
    }
    Ok(config)
}

/// Запоминает конфигурацию процесса; повторный вызов игнорируется
pub fn install(config: Config) {
    let _ = CONFIG.set(config);
}

/// Размер пакета импорта (из установленной конфигурации или по умолчанию)
pub fn import_batch_size() -> usize {
    CONFIG
        .get()
        .map(|c| c.import.batch_size)
        .unwrap_or_else(default_batch_size)
}

/// Get the database file path from configuration.
/// Relative paths are resolved against the executable directory.
pub fn get_database_path(config: &Config) -> PathBuf {
    let db_path = Path::new(&config.database.path);
    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }

    match std::env::current_exe() {
        Ok(exe_path) => match exe_path.parent() {
            Some(exe_dir) => exe_dir.join(db_path),
            None => db_path.to_path_buf(),
        },
        Err(_) => db_path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/mps.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.import.batch_size, 100);
        assert!(config.connectivity.enabled);
        assert!(config.connectivity.parsed_schedule().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.import.batch_size, 100);
        assert_eq!(config.connectivity.schedule, "0 0 * * * *");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[database]\npath = \"x.db\"\n[import]\nbatch_size = 0\n").is_err());

        let config = parse_config(
            "[database]\npath = \"x.db\"\n[connectivity]\nschedule = \"every hour\"\n",
        )
        .unwrap();
        assert!(config.connectivity.parsed_schedule().is_err());
    }
}
