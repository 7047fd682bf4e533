//! Runtime configuration.
//!
//! Loaded from a TOML file with `[redis]` and `[auth]` sections. String values
//! may reference environment variables as `${NAME}`; environment overrides are
//! applied after expansion:
//!
//! | variable                          | setting               |
//! |-----------------------------------|-----------------------|
//! | `MURMUR_REDIS_URL` / `REDIS_URL`  | `redis.url`           |
//! | `MURMUR_PREFIX`                   | `redis.prefix`        |
//! | `MURMUR_SECRET`                   | `auth.secret`         |
//! | `MURMUR_TOKEN_TTL`                | `auth.token_ttl_secs` |

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{DEFAULT_TOKEN_TTL, TokenSigner};

static VARIABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("variable pattern is valid"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("environment variable {0} not set")]
    MissingVariable(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("auth.secret must not be empty")]
    EmptySecret,
    #[error("auth.token_ttl_secs must be greater than zero")]
    ZeroTtl,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MurmurConfig {
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Leading segment of every key.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_prefix() -> String {
    "murmur".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL.as_secs()
}

impl MurmurConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path` (or defaults), then expand, override and validate
    /// against the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.expand(&lookup)?;
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace `${NAME}` references in every string setting.
    pub fn expand<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for value in [&mut self.redis.url, &mut self.redis.prefix, &mut self.auth.secret] {
            *value = expand_variables(value.as_str(), lookup)?;
        }
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MURMUR_REDIS_URL").or_else(|| lookup("REDIS_URL")) {
            self.redis.url = url;
        }
        if let Some(prefix) = lookup("MURMUR_PREFIX") {
            self.redis.prefix = prefix;
        }
        if let Some(secret) = lookup("MURMUR_SECRET") {
            self.auth.secret = secret;
        }
        if let Some(ttl) = lookup("MURMUR_TOKEN_TTL") {
            self.auth.token_ttl_secs = ttl.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MURMUR_TOKEN_TTL",
                value: ttl.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl_secs)
    }

    pub fn signer(&self) -> TokenSigner {
        TokenSigner::new(self.auth.secret.as_bytes().to_vec(), self.token_ttl())
    }
}

fn expand_variables<F>(value: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = None;
    let expanded = VARIABLE_PATTERN.replace_all(value, |caps: &Captures<'_>| {
        let name = &caps[1];
        lookup(name).unwrap_or_else(|| {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });
    match missing {
        Some(name) => Err(ConfigError::MissingVariable(name)),
        None => Ok(expanded.into_owned()),
    }
}
