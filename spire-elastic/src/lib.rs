//! Spire Elastic - search cluster connection lifecycle and index reconciliation
//!
//! This crate owns the connection to an Elasticsearch-compatible cluster and
//! guarantees that the application's logical index exists before it is used.
//!
//! # Architecture
//!
//! - **Nodes**: flattens comma-delimited node configuration into a host list
//! - **Admin**: narrow capability over the cluster client (exists, create,
//!   alias, list), with REST and in-memory backends
//! - **Alias**: picks the versioned concrete index (`<name>_v<N>`) an alias
//!   should point at
//! - **Reconcile**: the ensure-index algorithm
//! - **Lifecycle**: startup/shutdown of the connection
//! - **Retry**: fixed-period background reconciliation after a failed startup
//!
//! # Example
//!
//! ```ignore
//! use spire_elastic::{ElasticConfig, ElasticContext};
//!
//! let config = ElasticConfig::load_section(Path::new("app.toml"))?;
//! let context = ElasticContext::from_config(config);
//!
//! context.startup().await?;
//! // ...
//! context.shutdown().await;
//! ```

pub mod admin;
pub mod alias;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mapping;
pub mod metrics;
pub mod nodes;
pub mod reconcile;
pub mod retry;

pub use admin::{
    AdminCall, ConnectionSettings, Connector, HttpConnector, HttpIndexAdmin, IndexAdmin,
    MemoryConnector, MemoryIndexAdmin,
};
pub use alias::{latest_version, resolve_alias_target, AliasResolution, AliasTarget};
pub use config::ElasticConfig;
pub use error::{ElasticError, Result};
pub use lifecycle::{ConnectionHandle, ElasticContext, LifecycleState};
pub use mapping::{FileMappingSource, MappingSource, StaticMappingSource};
pub use nodes::resolve_nodes;
pub use reconcile::IndexReconciler;
pub use retry::{RetryHandle, RetryScheduler, RetryState, DEFAULT_RETRY_PERIOD};
