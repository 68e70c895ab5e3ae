//! Engine and service configuration.
//!
//! The engine config is read once at startup:
//! 1) `$ENGINE_CONFIG_PATH` (must exist if set)
//! 2) `config/engine.toml`
//! 3) the built-in seed registry with default policy

pub mod policy;
pub mod registry;

pub use policy::{InvertPolicy, ScoringPolicy};
pub use registry::{
    Dimension, DimensionId, Potential, PotentialId, Registry, TokenMatch, DIMENSION_COUNT,
    POTENTIAL_COUNT,
};

use crate::error::ConfigurationError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::info;

// --- env defaults & names ---
pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";

pub const ENV_APP_HOST: &str = "APP_HOST";
pub const ENV_APP_PORT: &str = "APP_PORT";
pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

/// Raw file shape before validation.
#[derive(Debug, Default, Deserialize)]
struct EngineConfigFile {
    #[serde(default)]
    potentials: Vec<Potential>,
    #[serde(default)]
    dimensions: Vec<Dimension>,
    #[serde(default)]
    typos: BTreeMap<String, String>,
    #[serde(default)]
    policy: ScoringPolicy,
}

/// Validated registry + policy. Immutable once built.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub registry: Registry,
    pub policy: ScoringPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry: Registry::default_seed(),
            policy: ScoringPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Resolve the config path from env / default location, falling back to the seed.
    pub fn load() -> Result<Self, ConfigurationError> {
        if let Ok(p) = std::env::var(ENV_ENGINE_CONFIG_PATH) {
            return Self::load_from_file(Path::new(&p));
        }
        let default_path = PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        info!("no engine config found, using built-in registry");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let cfg = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            typos = cfg.registry.typo_count(),
            invert_routing = ?cfg.policy.invert_routing,
            "engine config loaded"
        );
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigurationError> {
        let raw: EngineConfigFile =
            toml::from_str(toml_str).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        raw.policy.validate()?;
        let registry = Registry::new(raw.potentials, raw.dimensions, raw.typos)?;
        Ok(Self {
            registry,
            policy: raw.policy,
        })
    }
}

/// Settings for the HTTP service binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug_routes: bool,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var(ENV_APP_HOST).unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var(ENV_APP_PORT)
            .unwrap_or_else(|_| "3000".to_string())
            .trim()
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("{ENV_APP_PORT} must be a valid u16"))?;
        let debug_routes = std::env::var(ENV_DEBUG_ROUTES).ok().as_deref() == Some("1");
        Ok(Self {
            host,
            port,
            debug_routes,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("{ENV_APP_HOST} must be an IP address: {e}"))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_TOML: &str = r#"
[[potentials]]
id = "p1"
name = "One"
[[potentials]]
id = "p2"
name = "Two"
[[potentials]]
id = "p3"
name = "Three"
[[potentials]]
id = "p4"
name = "Four"
[[potentials]]
id = "p5"
name = "Five"
[[potentials]]
id = "p6"
name = "Six"
[[potentials]]
id = "p7"
name = "Seven"
[[potentials]]
id = "p8"
name = "Eight"
[[potentials]]
id = "p9"
name = "Nine"

[[dimensions]]
id = "a"
name = "Alpha"
[[dimensions]]
id = "b"
name = "Beta"
[[dimensions]]
id = "c"
name = "Gamma"

[typos]
pone = "p1"

[policy]
slow_factor = 1.0
"#;

    #[test]
    fn parses_full_file() {
        let cfg = EngineConfig::from_toml_str(MINI_TOML).expect("valid config");
        assert_eq!(cfg.registry.potentials()[8].id, "p9");
        assert_eq!(cfg.registry.dimensions()[2].name, "Gamma");
        assert_eq!(cfg.registry.typo_count(), 1);
        assert!((cfg.policy.slow_factor - 1.0).abs() < 1e-12);
        assert!((cfg.policy.invert_multiplier - 0.8).abs() < 1e-12);
    }

    #[test]
    fn missing_tables_are_configuration_errors() {
        let err = EngineConfig::from_toml_str("[policy]\nkeyword_hits = false\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::PotentialCount { found: 0, .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("[[potentials]\nid=").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn localhost_maps_to_loopback() {
        let s = ServerConfig {
            host: "localhost".into(),
            port: 8080,
            debug_routes: false,
        };
        assert_eq!(
            s.socket_addr().unwrap(),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080)
        );
    }
}
