//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::connector::elastic::DEFAULT_BULK_SIZE;
use crate::connector::redis::DEFAULT_LIST;
use crate::error::{RelayError, Result};

/// Default hand-off queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source endpoint configuration.
    pub source: SourceConfig,

    /// Target endpoint configuration.
    pub target: TargetConfig,

    /// Transfer behavior configuration.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            SourceConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(RelayError::Config("source.path is required".into()));
                }
            }
            SourceConfig::Redis { url, list } => {
                if url.is_empty() {
                    return Err(RelayError::Config("source.url is required".into()));
                }
                if list.is_empty() {
                    return Err(RelayError::Config("source.list must not be empty".into()));
                }
            }
        }

        match &self.target {
            TargetConfig::Elasticsearch {
                host,
                index,
                bulk_size,
                ..
            } => {
                if host.is_empty() {
                    return Err(RelayError::Config("target.host is required".into()));
                }
                if index.is_empty() {
                    return Err(RelayError::Config("target.index is required".into()));
                }
                if *bulk_size == 0 {
                    return Err(RelayError::Config(
                        "target.bulk_size must be at least 1".into(),
                    ));
                }
            }
            TargetConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(RelayError::Config("target.path is required".into()));
                }
            }
        }

        if self.relay.queue_capacity == 0 {
            return Err(RelayError::Config(
                "relay.queue_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Source endpoint configuration, tagged by connector type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Brace-framed JSON documents in a text file.
    File { path: PathBuf },

    /// Remote Redis list drained atomically.
    Redis {
        /// Server URL, e.g. `redis://localhost/8`.
        url: String,

        /// List key holding queued records.
        #[serde(default = "default_list")]
        list: String,
    },
}

/// Target endpoint configuration, tagged by connector type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    /// Bulk-indexed search target.
    Elasticsearch {
        host: String,

        #[serde(default = "default_es_port")]
        port: u16,

        /// Destination index name.
        index: String,

        /// Delete and recreate the index before transferring.
        #[serde(default)]
        recreate: bool,

        /// Records per bulk request.
        #[serde(default = "default_bulk_size")]
        bulk_size: usize,
    },

    /// Brace-framed JSON documents appended to a text file.
    File { path: PathBuf },
}

/// Transfer behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Hand-off queue capacity; producers suspend when it is full.
    pub queue_capacity: usize,

    /// Keep starting new cycles after each one completes.
    pub repeat: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            repeat: false,
        }
    }
}

fn default_list() -> String {
    DEFAULT_LIST.to_string()
}

fn default_es_port() -> u16 {
    9200
}

fn default_bulk_size() -> usize {
    DEFAULT_BULK_SIZE
}
