use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_RANDOM_ORG_BASE_URL: &str = "https://www.random.org";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: String, // "stdio" or "server"
    pub port: u16,
    pub default_sides: i64,
    pub random: RandomSourceConfig,
}

/// Outbound settings for the random.org client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSourceConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RandomSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RANDOM_ORG_BASE_URL.into(),
            connect_timeout_ms: 2_000,
            timeout_ms: 6_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: "stdio".into(),
            port: 8080,
            default_sides: 3,
            random: RandomSourceConfig::default(),
        }
    }
}

/// On-disk shape of `COIN_FLIP_CONFIG`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    mode: Option<String>,
    port: Option<u16>,
    default_sides: Option<i64>,
    #[serde(default)]
    random_org: FileRandomOrg,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRandomOrg {
    base_url: Option<String>,
    connect_timeout_ms: Option<u64>,
    timeout_ms: Option<u64>,
}

impl Config {
    /// Defaults, then the TOML file named by `COIN_FLIP_CONFIG` (if any),
    /// then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(path) = std::env::var_os("COIN_FLIP_CONFIG").filter(|p| !p.is_empty()) {
            cfg.apply_file(PathBuf::from(path))?;
        }
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_file(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: FileConfig =
            toml::from_str(&raw).map_err(|source| ConfigError::Toml { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded config file");

        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(sides) = file.default_sides {
            self.default_sides = sides;
        }
        if let Some(base) = file.random_org.base_url {
            self.random.base_url = base;
        }
        if let Some(ms) = file.random_org.connect_timeout_ms {
            self.random.connect_timeout_ms = ms;
        }
        if let Some(ms) = file.random_org.timeout_ms {
            self.random.timeout_ms = ms;
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(mode) = std::env::var("MODE") {
            self.mode = mode;
        }
        if let Some(port) = env_parse::<u16>("PORT") {
            self.port = port;
        }
        if let Some(sides) = env_parse::<i64>("FLIP_DEFAULT_SIDES") {
            self.default_sides = sides;
        }
        if let Ok(base) = std::env::var("RANDOM_ORG_BASE_URL") {
            if !base.trim().is_empty() {
                self.random.base_url = base;
            }
        }
        if let Some(ms) = env_parse::<u64>("RANDOM_ORG_CONNECT_TIMEOUT_MS") {
            self.random.connect_timeout_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("RANDOM_ORG_TIMEOUT_MS") {
            self.random.timeout_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.mode.as_str(), "stdio" | "server") {
            return Err(ConfigError::Invalid(format!(
                "Invalid MODE: {}. Must be 'stdio' or 'server'",
                self.mode
            )));
        }
        if self.mode == "server" && self.port == 0 {
            return Err(ConfigError::Invalid("PORT cannot be 0".into()));
        }
        let base = self.random.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "random.org base URL must be http(s), got {base:?}"
            )));
        }
        if self.random.connect_timeout_ms == 0 || self.random.timeout_ms == 0 {
            return Err(ConfigError::Invalid("random.org timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Every variable `Config::load` reads.
#[cfg(test)]
pub(crate) const ENV_KEYS: [&str; 7] = [
    "MODE",
    "PORT",
    "FLIP_DEFAULT_SIDES",
    "RANDOM_ORG_BASE_URL",
    "RANDOM_ORG_CONNECT_TIMEOUT_MS",
    "RANDOM_ORG_TIMEOUT_MS",
    "COIN_FLIP_CONFIG",
];

#[cfg(test)]
pub(crate) fn clear_env() {
    for k in ENV_KEYS {
        std::env::remove_var(k);
    }
}
