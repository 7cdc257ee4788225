//! Configuration for keystack.
//!
//! Loaded from `~/.keystack/config.toml`. Every section is optional; a
//! missing file means built-in defaults.
//!
//! ```toml
//! [stack]
//! default_capacity = 16
//!
//! [token]
//! vendor_id = 0x18d1
//! product_id = 0x4ee8
//! interface = 0
//!
//! [endpoint]
//! name = "int_stack"
//! dir = "${XDG_RUNTIME_DIR}/keystack"
//!
//! [log]
//! filter = "info"
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use keystack_types::{Capacity, TokenId};

pub const DEFAULT_VENDOR_ID: u16 = 0x18d1;
pub const DEFAULT_PRODUCT_ID: u16 = 0x4ee8;
pub const DEFAULT_ENDPOINT_NAME: &str = "int_stack";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeystackConfig {
    pub stack: Option<StackConfig>,
    pub token: Option<TokenConfig>,
    pub endpoint: Option<EndpointConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Capacity the stack starts with. Default: 16. Must be positive.
    pub default_capacity: Option<i64>,
}

/// Identity of the one token that authorizes access.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    /// Interface number whose events drive the gate. Default: 0.
    pub interface: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: Option<String>,
    /// Directory the endpoint descriptor is published into. `${VAR}` is expanded.
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl KeystackConfig {
    /// Load the config from its default location, if there is one.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load the config from an explicit path. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.default_capacity().map(|_| ())
    }

    pub fn default_capacity(&self) -> Result<Capacity, ConfigError> {
        match self.stack.as_ref().and_then(|s| s.default_capacity) {
            None => Ok(Capacity::DEFAULT),
            Some(raw) => Capacity::new(raw).map_err(|err| ConfigError::Invalid {
                field: "stack.default_capacity",
                message: err.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn token(&self) -> TokenId {
        let token = self.token.as_ref();
        TokenId::new(
            token
                .and_then(|t| t.vendor_id)
                .unwrap_or(DEFAULT_VENDOR_ID),
            token
                .and_then(|t| t.product_id)
                .unwrap_or(DEFAULT_PRODUCT_ID),
        )
    }

    #[must_use]
    pub fn token_interface(&self) -> u8 {
        self.token.as_ref().and_then(|t| t.interface).unwrap_or(0)
    }

    #[must_use]
    pub fn endpoint_name(&self) -> &str {
        self.endpoint
            .as_ref()
            .and_then(|e| e.name.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT_NAME)
    }

    /// Directory endpoint descriptors are published into.
    ///
    /// Falls back to the user runtime dir, then `~/.keystack/run`, then
    /// `./.keystack/run`.
    #[must_use]
    pub fn endpoint_dir(&self) -> PathBuf {
        if let Some(dir) = self.endpoint.as_ref().and_then(|e| e.dir.as_deref()) {
            return PathBuf::from(expand_env_vars(dir));
        }
        dirs::runtime_dir()
            .map(|dir| dir.join("keystack"))
            .or_else(|| dirs::home_dir().map(|home| home.join(".keystack").join("run")))
            .unwrap_or_else(|| PathBuf::from(".keystack").join("run"))
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.filter.as_deref())
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".keystack").join("config.toml"))
}
