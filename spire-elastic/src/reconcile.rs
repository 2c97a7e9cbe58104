//! Index existence reconciliation
//!
//! [`IndexReconciler::ensure_index`] makes sure a name resolves to an index in
//! the cluster. Plain names get a concrete index; alias names get a versioned
//! concrete index (`<name>_v<N>`) with the name bound to it as an alias.
//!
//! ```text
//! exists(name)? ── yes ──> done
//!      │ no
//!      ▼
//! alias mode? ── no ──> create_index(name)
//!      │ yes
//!      ▼
//! list indices → highest <name>_v<N>, or create <name>_v1
//!      ▼
//! create_alias(<name>_v<N> → name)
//! ```
//!
//! There is no locking around the list/create/alias sequence: two concurrent
//! reconciliations of the same missing name can both create a first version.

use crate::admin::IndexAdmin;
use crate::alias::{is_versioned, latest_version, AliasTarget};
use crate::config::ElasticConfig;
use crate::error::Result;
use crate::mapping::MappingSource;
use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ensures indices (and their aliases) exist
#[derive(Clone)]
pub struct IndexReconciler {
    admin: Arc<dyn IndexAdmin>,
    mapping: Arc<dyn MappingSource>,
    item_index_name: String,
    index_name_is_alias: bool,
}

impl IndexReconciler {
    pub fn new(
        admin: Arc<dyn IndexAdmin>,
        mapping: Arc<dyn MappingSource>,
        config: &ElasticConfig,
    ) -> Self {
        Self {
            admin,
            mapping,
            item_index_name: config.item_index_name().to_string(),
            index_name_is_alias: config.index_name_is_alias,
        }
    }

    pub fn admin(&self) -> &Arc<dyn IndexAdmin> {
        &self.admin
    }

    /// Ensure that `name` exists, creating it if required
    ///
    /// For the configured item index the configured alias flag overrides
    /// `consider_as_alias`; names containing `_v` are never aliased. Empty
    /// names are ignored. Errors are logged and returned as-is.
    pub async fn ensure_index(&self, name: &str, consider_as_alias: bool) -> Result<()> {
        if name.trim().is_empty() {
            return Ok(());
        }
        debug!(index = %name, "Checking index");

        let start = Instant::now();
        let result = self.reconcile(name, consider_as_alias).await;
        metrics::record_reconcile(result.is_ok(), start.elapsed());

        if let Err(e) = &result {
            error!(index = %name, error = %e, "Error ensuring index");
        }
        result
    }

    async fn reconcile(&self, name: &str, consider_as_alias: bool) -> Result<()> {
        if self.admin.exists(name).await? {
            return Ok(());
        }

        let mut as_alias = consider_as_alias;
        if name == self.item_index_name {
            as_alias = self.index_name_is_alias;
        }
        if is_versioned(name) {
            as_alias = false;
        }

        if !as_alias {
            return self.create_index(name).await;
        }

        let existing = self.admin.list_index_names().await?;
        // Showed up between the existence check and the listing
        if existing.contains(name) {
            return Ok(());
        }

        let AliasTarget {
            target,
            needs_create,
        } = latest_version(name, &existing);
        if needs_create {
            self.create_index(&target).await?;
        }
        self.admin.create_alias(&target, name).await?;
        metrics::record_alias_created(name);
        info!(index = %target, alias = %name, "Bound alias");
        Ok(())
    }

    async fn create_index(&self, name: &str) -> Result<()> {
        let mapping = self.mapping.read_mapping()?;
        self.admin.create_index(name, &mapping).await?;
        metrics::record_index_created(name);
        info!(index = %name, "Created index");
        Ok(())
    }
}
