//! uplink.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UplinkConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Maximum accepted webhook body size.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `uplink.redb`.
    pub data_dir: PathBuf,
    pub write_mode: WriteMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            write_mode: WriteMode::default(),
        }
    }
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("uplink.redb")
    }
}

/// How the device-series and global-series appends are committed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Both appends in one transaction.
    #[default]
    Atomic,
    /// Device append, then global append, in separate transactions. A
    /// failure in between leaves the device entry without a global one.
    Sequential,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => f.write_str("atomic"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(Self::Atomic),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown write mode '{other}' (expected atomic|sequential)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
    /// Optional ceiling on `?limit=`. Unset means caller-supplied limits
    /// are honored as-is.
    pub max_latest_limit: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_latest_limit: None,
        }
    }
}

impl QueryConfig {
    /// Resolve a raw `limit` query parameter.
    ///
    /// Absent, non-numeric and zero values fall back to `default_limit`.
    pub fn resolve_limit(&self, raw: Option<&str>) -> usize {
        let requested = raw
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.default_limit);
        match self.max_latest_limit {
            Some(max) => requested.min(max),
            None => requested,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    /// `["*"]` allows any origin; an empty list disables CORS headers.
    pub allowed_origins: Vec<String>,
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_seconds: 600,
        }
    }
}

impl UplinkConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: UplinkConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_roundtrip_through_toml() {
        let config = UplinkConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("write_mode = \"atomic\""));
        assert!(toml_str.contains("port = 3000"));

        let parsed: UplinkConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[store]
write_mode = "sequential"

[query]
max_latest_limit = 100
"#;
        let config: UplinkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.write_mode, WriteMode::Sequential);
        assert_eq!(config.store.data_dir, PathBuf::from("data"));
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.query.max_latest_limit, Some(100));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cors.allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_parse_empty() {
        let config: UplinkConfig = toml::from_str("").unwrap();
        assert_eq!(config, UplinkConfig::default());
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("uplink-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("uplink.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = UplinkConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(UplinkConfig::from_file(&dir.join("missing.toml")).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_mode_from_str() {
        assert_eq!("atomic".parse::<WriteMode>(), Ok(WriteMode::Atomic));
        assert_eq!("sequential".parse::<WriteMode>(), Ok(WriteMode::Sequential));
        assert!("eventual".parse::<WriteMode>().is_err());
        assert_eq!(WriteMode::Sequential.to_string(), "sequential");
    }

    #[test]
    fn test_resolve_limit() {
        let query = QueryConfig::default();
        assert_eq!(query.resolve_limit(None), 10);
        assert_eq!(query.resolve_limit(Some("3")), 3);
        assert_eq!(query.resolve_limit(Some("abc")), 10);
        assert_eq!(query.resolve_limit(Some("0")), 10);
        assert_eq!(query.resolve_limit(Some("-4")), 10);
        assert_eq!(query.resolve_limit(Some("5000")), 5000);

        let capped = QueryConfig {
            max_latest_limit: Some(50),
            ..QueryConfig::default()
        };
        assert_eq!(capped.resolve_limit(Some("5000")), 50);
        assert_eq!(capped.resolve_limit(Some("7")), 7);
    }
}
