//! In-process admin backend
//!
//! Keeps indices and aliases in memory and records every call, so hosts can
//! run without a cluster and tests can assert on the exact admin traffic.

use super::{ConnectionSettings, Connector, IndexAdmin};
use crate::error::{ElasticError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A recorded admin call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    Exists(String),
    CreateIndex(String),
    CreateAlias { index: String, alias: String },
    ListIndices,
    Close,
}

#[derive(Default)]
struct MemoryCluster {
    indices: BTreeMap<String, Value>,
    aliases: BTreeMap<String, String>,
    calls: Vec<AdminCall>,
    fail_remaining: usize,
    closed: bool,
}

/// In-memory cluster implementing [`IndexAdmin`]
#[derive(Default)]
pub struct MemoryIndexAdmin {
    inner: Mutex<MemoryCluster>,
}

impl MemoryIndexAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given concrete indices already present
    pub fn with_indices<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let admin = Self::new();
        {
            let mut inner = admin.inner.lock();
            for name in names {
                inner.indices.insert(name.into(), Value::Null);
            }
        }
        admin
    }

    /// Make the next `count` calls fail with a transport error
    pub fn fail_next(&self, count: usize) {
        self.inner.lock().fail_remaining = count;
    }

    /// Make every call fail until [`MemoryIndexAdmin::recover`]
    pub fn fail_always(&self) {
        self.fail_next(usize::MAX);
    }

    pub fn recover(&self) {
        self.fail_next(0);
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn index_names(&self) -> Vec<String> {
        self.inner.lock().indices.keys().cloned().collect()
    }

    /// Mapping body an index was created with
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.inner.lock().indices.get(index).cloned()
    }

    /// Concrete index an alias points at
    pub fn alias_target(&self, alias: &str) -> Option<String> {
        self.inner.lock().aliases.get(alias).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn record(&self, call: AdminCall) -> Result<parking_lot::MutexGuard<'_, MemoryCluster>> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        if inner.fail_remaining > 0 {
            if inner.fail_remaining != usize::MAX {
                inner.fail_remaining -= 1;
            }
            return Err(ElasticError::Transport(
                "simulated cluster failure".to_string(),
            ));
        }
        Ok(inner)
    }
}

#[async_trait]
impl IndexAdmin for MemoryIndexAdmin {
    async fn exists(&self, name: &str) -> Result<bool> {
        let inner = self.record(AdminCall::Exists(name.to_string()))?;
        Ok(inner.indices.contains_key(name) || inner.aliases.contains_key(name))
    }

    async fn create_index(&self, name: &str, mapping: &Value) -> Result<()> {
        let mut inner = self.record(AdminCall::CreateIndex(name.to_string()))?;
        if inner.indices.contains_key(name) || inner.aliases.contains_key(name) {
            return Err(ElasticError::cluster(
                400,
                format!("resource_already_exists_exception: {}", name),
            ));
        }
        inner.indices.insert(name.to_string(), mapping.clone());
        Ok(())
    }

    async fn create_alias(&self, index: &str, alias: &str) -> Result<()> {
        let mut inner = self.record(AdminCall::CreateAlias {
            index: index.to_string(),
            alias: alias.to_string(),
        })?;
        if !inner.indices.contains_key(index) {
            return Err(ElasticError::cluster(
                404,
                format!("index_not_found_exception: {}", index),
            ));
        }
        if inner.indices.contains_key(alias) {
            return Err(ElasticError::cluster(
                400,
                format!("invalid_alias_name_exception: {}", alias),
            ));
        }
        inner.aliases.insert(alias.to_string(), index.to_string());
        Ok(())
    }

    async fn list_index_names(&self) -> Result<BTreeSet<String>> {
        let inner = self.record(AdminCall::ListIndices)?;
        Ok(inner.indices.keys().cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(AdminCall::Close);
        inner.closed = true;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Connector handing out a shared [`MemoryIndexAdmin`]
#[derive(Default)]
pub struct MemoryConnector {
    admin: Arc<MemoryIndexAdmin>,
    connects: Mutex<Vec<ConnectionSettings>>,
    refuse: Mutex<bool>,
}

impl MemoryConnector {
    pub fn new(admin: Arc<MemoryIndexAdmin>) -> Self {
        Self {
            admin,
            connects: Mutex::new(Vec::new()),
            refuse: Mutex::new(false),
        }
    }

    pub fn admin(&self) -> &Arc<MemoryIndexAdmin> {
        &self.admin
    }

    /// Refuse (or accept again) new connections
    pub fn set_refuse(&self, refuse: bool) {
        *self.refuse.lock() = refuse;
    }

    /// Settings of every successful connect, in order
    pub fn connects(&self) -> Vec<ConnectionSettings> {
        self.connects.lock().clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn IndexAdmin>> {
        if *self.refuse.lock() {
            return Err(ElasticError::Connection(format!(
                "connection refused: {}",
                settings.nodes.join(",")
            )));
        }
        self.connects.lock().push(settings.clone());
        self.admin.inner.lock().closed = false;
        Ok(self.admin.clone())
    }
}
