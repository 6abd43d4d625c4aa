use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Journal file for durable bindings. `None` keeps bindings in memory
    /// only, so every restart invalidates previously issued tokens.
    pub journal_path: Option<PathBuf>,
    pub sync_journal: bool,
    pub max_body_bytes: usize,
    pub max_mint_attempts: u32,
    /// Value of `Access-Control-Allow-Origin` on every response.
    pub allow_origin: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            journal_path: None,
            sync_journal: false,
            max_body_bytes: 16 * 1024,
            max_mint_attempts: tokmap_store::DEFAULT_MAX_MINT_ATTEMPTS,
            allow_origin: "*".into(),
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.max_mint_attempts == 0 {
            return Err(ServerError::Config("max_mint_attempts must be at least 1".into()));
        }
        if self.max_body_bytes < 64 {
            return Err(ServerError::Config("max_body_bytes must be at least 64".into()));
        }
        self.allow_origin_header()?;
        Ok(())
    }

    pub(crate) fn allow_origin_header(&self) -> ServerResult<HeaderValue> {
        HeaderValue::from_str(&self.allow_origin)
            .map_err(|_| ServerError::Config(format!("invalid allow_origin: {:?}", self.allow_origin)))
    }
}
