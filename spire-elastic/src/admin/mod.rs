//! Index administration capability
//!
//! The cluster client itself lives outside this crate; reconciliation only
//! needs four admin calls, exposed through [`IndexAdmin`]. A [`Connector`]
//! opens a connection and hands back the capability.
//!
//! # Backends
//!
//! - **HTTP**: Elasticsearch REST API over `reqwest`
//! - **Memory**: in-process cluster with a call log and failure injection

mod http;
mod memory;

pub use http::{HttpConnector, HttpIndexAdmin};
pub use memory::{AdminCall, MemoryConnector, MemoryIndexAdmin};

use crate::config::ElasticConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Admin operations on a live cluster connection
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Whether an index or alias with this name exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Create an index, using `mapping` verbatim as the request body
    async fn create_index(&self, name: &str, mapping: &Value) -> Result<()>;

    /// Bind `alias` to `index`
    async fn create_alias(&self, index: &str, alias: &str) -> Result<()>;

    /// Names of all concrete indices in the cluster
    async fn list_index_names(&self) -> Result<BTreeSet<String>>;

    /// Check the connection reaches the expected cluster
    async fn verify_cluster(&self) -> Result<()> {
        Ok(())
    }

    /// Release the connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Get the admin backend name
    fn backend_name(&self) -> &'static str;
}

/// Everything needed to open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Resolved, non-empty node list
    pub nodes: Vec<String>,
    pub transport_port: u16,
    pub http_port: u16,
    pub cluster_name: Option<String>,
    pub request_timeout: Duration,
}

impl ConnectionSettings {
    /// Build settings for `nodes` from the rest of the config
    pub fn from_config(config: &ElasticConfig, nodes: Vec<String>) -> Self {
        Self {
            nodes,
            transport_port: config.transport_port,
            http_port: config.http_port,
            cluster_name: config.cluster_name().map(str::to_string),
            request_timeout: config.request_timeout(),
        }
    }
}

/// Opens cluster connections
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn IndexAdmin>>;
}
