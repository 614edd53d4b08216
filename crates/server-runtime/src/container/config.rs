//! # Server Configuration
//!
//! Unified configuration for all subsystems.
//!
//! Sources, later ones winning:
//!
//! 1. `Default` impls of every section
//! 2. The TOML file named by `XS_CONFIG`, if set
//! 3. `XS_*` environment variables
//!
//! The server domain is validated before anything is wired; a domain that
//! does not parse as an address aborts startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shared_types::{Address, ConfigurationError};
use xs_01_traffic_accounting::TrafficConfig;
use xs_02_stanza_id::StampingConfig;
use xs_03_sequencing::SequencingConfig;
use xs_05_version_query::VersionQueryConfig;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "XS_CONFIG";

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Local domain. Used as the `by` of stanza ids and as the sender of
    /// server-originated queries.
    pub domain: String,
    /// Domain of the group chat service whose messages get sequenced.
    /// Empty means `conference.<domain>`.
    pub group_chat_domain: String,
    pub stamping: StampingConfig,
    pub sequencing: SequencingConfig,
    pub traffic: TrafficConfig,
    pub version_query: VersionQueryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            group_chat_domain: String::new(),
            stamping: StampingConfig::default(),
            sequencing: SequencingConfig::default(),
            traffic: TrafficConfig::default(),
            version_query: VersionQueryConfig::default(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

impl ServerConfig {
    /// Load from `XS_CONFIG` (if set) and the environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied. Not validated.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a TOML file. Missing sections keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `XS_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domain) = lookup("XS_DOMAIN") {
            self.domain = domain;
        }
        if let Some(domain) = lookup("XS_GROUPCHAT_DOMAIN") {
            self.group_chat_domain = domain;
        }

        // Stamping toggles
        override_bool(&lookup, "XS_SID_ENABLED", &mut self.stamping.enabled);
        override_bool(&lookup, "XS_SID_MESSAGE_ENABLED", &mut self.stamping.message_enabled);
        override_bool(&lookup, "XS_SID_PRESENCE_ENABLED", &mut self.stamping.presence_enabled);
        override_bool(&lookup, "XS_SID_IQ_ENABLED", &mut self.stamping.iq_enabled);

        // Sequencing
        override_parsed(&lookup, "XS_NODE_ID", &mut self.sequencing.node_id);
        override_parsed(&lookup, "XS_SEQUENCE_BLOCK_SIZE", &mut self.sequencing.block_size);
        override_parsed(&lookup, "XS_LOG_BATCH_SIZE", &mut self.sequencing.log_batch_size);
        override_parsed(&lookup, "XS_LOG_FLUSH_MS", &mut self.sequencing.log_flush_ms);

        // Traffic
        override_parsed(
            &lookup,
            "XS_TRAFFIC_SAMPLE_SECS",
            &mut self.traffic.sample_interval_secs,
        );

        // Version query
        override_bool(&lookup, "XS_VERSION_QUERY_ENABLED", &mut self.version_query.enabled);
        override_parsed(&lookup, "XS_VERSION_QUERY_DELAY_MS", &mut self.version_query.delay_ms);
    }

    /// Check the settings that cannot be corrected at runtime.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.domain_address()?;
        self.group_chat_address()?;
        if self.traffic.sample_interval_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "traffic.sample_interval_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// The server domain as an address.
    pub fn domain_address(&self) -> Result<Address, ConfigurationError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigurationError::MissingAddress {
                role: "server domain",
            });
        }
        Address::parse(&self.domain)
    }

    /// The group chat service domain as an address.
    pub fn group_chat_address(&self) -> Result<Address, ConfigurationError> {
        if self.group_chat_domain.is_empty() {
            Address::parse(&format!("conference.{}", self.domain))
        } else {
            Address::parse(&self.group_chat_domain)
        }
    }
}

fn override_bool<F>(lookup: &F, key: &str, target: &mut bool)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key) {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => *target = true,
            "false" | "0" | "no" | "off" => *target = false,
            _ => warn!(key, value = %value, "Ignoring unparseable boolean"),
        }
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(value) = lookup(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key, value = %value, "Ignoring unparseable value"),
        }
    }
}
