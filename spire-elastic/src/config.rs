//! Cluster connection configuration
//!
//! ```toml
//! [elastic]
//! nodes = ["es-1, es-2", "es-3"]
//! cluster_name = "search"
//! index_name = "metadata"
//! index_name_is_alias = true
//! auto_create_index = true
//! mappings_file = "config/elastic-mappings.json"
//! ```

use crate::error::Result;
use crate::nodes::resolve_nodes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection and index settings, read once before startup
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ElasticConfig {
    /// Node addresses; each entry may hold several comma-separated hosts
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Transport port (default=9300)
    #[serde(default = "default_transport_port")]
    pub transport_port: u16,

    /// HTTP port used by the REST adapter (default=9200)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Expected cluster name
    #[serde(default)]
    pub cluster_name: Option<String>,

    /// Logical index name (default=metadata)
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Treat the index name as an alias over versioned indices
    #[serde(default = "default_true")]
    pub index_name_is_alias: bool,

    /// Create the index (and alias) at startup if missing
    #[serde(default)]
    pub auto_create_index: bool,

    /// Index mappings document
    #[serde(default = "default_mappings_file")]
    pub mappings_file: PathBuf,

    /// Period between background reconciliation attempts
    #[serde(default = "default_retry_period")]
    pub retry_period_secs: u64,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_transport_port() -> u16 {
    9300
}

fn default_http_port() -> u16 {
    9200
}

fn default_index_name() -> String {
    "metadata".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mappings_file() -> PathBuf {
    PathBuf::from("config/elastic-mappings.json")
}

fn default_retry_period() -> u64 {
    5 * 60
}

fn default_request_timeout() -> u64 {
    30000
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            transport_port: default_transport_port(),
            http_port: default_http_port(),
            cluster_name: None,
            index_name: default_index_name(),
            index_name_is_alias: default_true(),
            auto_create_index: false,
            mappings_file: default_mappings_file(),
            retry_period_secs: default_retry_period(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    elastic: ElasticConfig,
}

impl ElasticConfig {
    /// Parse a config from a TOML document holding the fields at top level
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse the `[elastic]` table of a larger TOML document
    pub fn from_toml_section(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.elastic)
    }

    /// Load a config file holding the fields at top level
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the `[elastic]` table of an application config file
    pub fn load_section(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_section(&content)
    }

    /// The index holding metadata items
    pub fn item_index_name(&self) -> &str {
        &self.index_name
    }

    /// Flattened, trimmed node list
    pub fn resolved_nodes(&self) -> Vec<String> {
        resolve_nodes(&self.nodes)
    }

    /// Cluster name, if configured and non-empty
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
