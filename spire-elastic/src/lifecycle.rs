//! Cluster connection lifecycle
//!
//! [`ElasticContext`] owns the one live connection to the search cluster:
//!
//! ```text
//! Stopped → Starting → Running → Stopped
//!     └──→ Degraded (no nodes defined)
//! ```
//!
//! Startup opens the connection and, when auto-create is enabled, reconciles
//! the configured index once. If that fails the connection stays up and a
//! background retry keeps reconciling until it succeeds. Shutdown is
//! idempotent and releases the connection and any pending retry.

use crate::admin::{ConnectionSettings, Connector, HttpConnector, IndexAdmin};
use crate::config::ElasticConfig;
use crate::error::{ElasticError, Result};
use crate::mapping::{FileMappingSource, MappingSource};
use crate::reconcile::IndexReconciler;
use crate::retry::{RetryHandle, RetryScheduler};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle state of the cluster connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    /// Startup found no nodes to connect to
    Degraded,
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Stopped
    }
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Degraded => "degraded",
        }
    }
}

/// An open cluster connection
pub struct ConnectionHandle {
    settings: ConnectionSettings,
    reconciler: IndexReconciler,
    generation: u64,
}

impl ConnectionHandle {
    /// Counts connections opened by the owning context, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn admin(&self) -> &Arc<dyn IndexAdmin> {
        self.reconciler.admin()
    }

    async fn close(self) {
        if let Err(e) = self.admin().close().await {
            warn!(error = %e, "Error closing cluster connection");
        }
    }
}

#[derive(Default)]
struct Inner {
    state: LifecycleState,
    handle: Option<ConnectionHandle>,
    retry: Option<RetryHandle>,
    generation: u64,
}

impl Inner {
    /// Whether `generation` is still the installed, running connection
    fn is_live(&self, generation: u64) -> bool {
        self.state == LifecycleState::Running
            && self
                .handle
                .as_ref()
                .is_some_and(|h| h.generation == generation)
    }
}

/// Owns the cluster connection and the index it must guarantee
pub struct ElasticContext {
    config: ElasticConfig,
    connector: Arc<dyn Connector>,
    mapping: Arc<dyn MappingSource>,
    inner: Arc<Mutex<Inner>>,
}

impl ElasticContext {
    pub fn new(
        config: ElasticConfig,
        connector: Arc<dyn Connector>,
        mapping: Arc<dyn MappingSource>,
    ) -> Self {
        Self {
            config,
            connector,
            mapping,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// REST connector and file mappings, as configured
    pub fn from_config(config: ElasticConfig) -> Self {
        let mapping = Arc::new(FileMappingSource::new(config.mappings_file.clone()));
        Self::new(config, Arc::new(HttpConnector::new()), mapping)
    }

    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().handle.is_some()
    }

    /// Whether a background reconciliation is still pending
    pub fn has_pending_retry(&self) -> bool {
        self.inner
            .lock()
            .retry
            .as_ref()
            .is_some_and(|retry| !retry.is_cancelled())
    }

    /// Settings of the live connection, if connected
    pub fn connection_settings(&self) -> Option<ConnectionSettings> {
        self.inner.lock().handle.as_ref().map(|h| h.settings().clone())
    }

    /// The live admin capability, if connected
    pub fn admin(&self) -> Option<Arc<dyn IndexAdmin>> {
        self.inner.lock().handle.as_ref().map(|h| h.admin().clone())
    }

    /// Open the connection and reconcile the configured index
    ///
    /// Missing nodes and a repeated startup only log a warning. A failed
    /// reconciliation schedules a background retry instead of failing.
    /// Only a failure to open the connection is returned.
    pub async fn startup(&self) -> Result<()> {
        info!("Starting up cluster context...");

        let nodes = self.config.resolved_nodes();
        {
            let mut inner = self.inner.lock();
            if nodes.is_empty() {
                warn!("Configuration warning: no cluster nodes defined");
                if inner.handle.is_none() {
                    inner.state = LifecycleState::Degraded;
                }
                return Ok(());
            }
            if inner.handle.is_some() || inner.state == LifecycleState::Starting {
                warn!("Configuration warning: cluster connection has already been started");
                return Ok(());
            }
            inner.state = LifecycleState::Starting;
        }

        let settings = ConnectionSettings::from_config(&self.config, nodes);
        let admin = match self.connector.connect(&settings).await {
            Ok(admin) => admin,
            Err(e) => {
                error!(error = %e, "Failed to open cluster connection");
                self.inner.lock().state = LifecycleState::Stopped;
                return Err(e);
            }
        };

        let reconciler = IndexReconciler::new(admin, self.mapping.clone(), &self.config);
        let (generation, orphan) = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            let handle = ConnectionHandle {
                settings,
                reconciler: reconciler.clone(),
                generation: inner.generation,
            };
            if inner.state == LifecycleState::Starting {
                inner.handle = Some(handle);
                inner.state = LifecycleState::Running;
                (inner.generation, None)
            } else {
                (inner.generation, Some(handle))
            }
        };
        if let Some(orphan) = orphan {
            info!("Cluster context shut down while connecting, closing new connection");
            orphan.close().await;
            return Ok(());
        }

        if self.config.auto_create_index {
            self.reconcile_at_startup(reconciler, generation).await;
        }

        Ok(())
    }

    async fn reconcile_at_startup(&self, reconciler: IndexReconciler, generation: u64) {
        let name = self.config.item_index_name().to_string();
        let as_alias = self.config.index_name_is_alias;
        if reconciler.ensure_index(&name, as_alias).await.is_ok() {
            return;
        }

        // Scheduled and installed under one lock, so the success hook
        // always finds its own handle.
        let mut inner = self.inner.lock();
        if !inner.is_live(generation) {
            debug!(
                index = %name,
                generation,
                "Connection replaced or closed during startup reconciliation, not retrying"
            );
            return;
        }

        let scheduler = RetryScheduler::new(self.config.retry_period());
        warn!(
            index = %name,
            retry_every = ?scheduler.period(),
            "Index not ready at startup, reconciling in background"
        );
        let shared = Arc::downgrade(&self.inner);
        let retry = scheduler.schedule_with(reconciler, name, as_alias, move || {
            if let Some(shared) = shared.upgrade() {
                let mut inner = shared.lock();
                if inner.is_live(generation) {
                    inner.retry = None;
                }
            }
        });
        inner.retry = Some(retry);
    }

    /// Ensure an index exists on the live connection
    pub async fn ensure_index(&self, name: &str, consider_as_alias: bool) -> Result<()> {
        let reconciler = self
            .inner
            .lock()
            .handle
            .as_ref()
            .map(|h| h.reconciler.clone())
            .ok_or(ElasticError::NotConnected)?;
        reconciler.ensure_index(name, consider_as_alias).await
    }

    /// Check the connection reaches the configured cluster
    pub async fn check_cluster(&self) -> Result<()> {
        let admin = self.admin().ok_or(ElasticError::NotConnected)?;
        admin.verify_cluster().await
    }

    /// Close the connection and stop any pending retry
    ///
    /// Safe to call repeatedly and in any state.
    pub async fn shutdown(&self) {
        info!("Shutting down cluster context...");

        let (handle, retry) = {
            let mut inner = self.inner.lock();
            inner.state = LifecycleState::Stopped;
            (inner.handle.take(), inner.retry.take())
        };

        if let Some(retry) = retry {
            retry.stop();
        }
        if let Some(handle) = handle {
            handle.close().await;
        }
    }
}

impl Drop for ElasticContext {
    fn drop(&mut self) {
        if let Some(retry) = self.inner.lock().retry.take() {
            retry.abort();
        }
    }
}
