//! Elasticsearch REST admin backend
//!
//! Requests go to the first node that accepts the connection; nodes that
//! refuse or time out are skipped with a warning.

use super::{ConnectionSettings, Connector, IndexAdmin};
use crate::error::{ElasticError, Result};
use crate::metrics;
use crate::nodes::node_base_url;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: String,
}

#[derive(Debug, Deserialize)]
struct RootInfo {
    cluster_name: String,
}

/// [`IndexAdmin`] over the Elasticsearch REST API
pub struct HttpIndexAdmin {
    client: Client,
    base_urls: Vec<String>,
    cluster_name: Option<String>,
}

impl HttpIndexAdmin {
    /// Create an admin client for the given settings
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        if settings.nodes.is_empty() {
            return Err(ElasticError::Config("no nodes defined".to_string()));
        }
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ElasticError::Connection(e.to_string()))?;
        let base_urls = settings
            .nodes
            .iter()
            .map(|node| node_base_url(node, settings.http_port))
            .collect();

        Ok(Self {
            client,
            base_urls,
            cluster_name: settings.cluster_name.clone(),
        })
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// Compare the configured cluster name with the one the cluster reports
    pub async fn verify_cluster_name(&self) -> Result<()> {
        let Some(expected) = self.cluster_name.as_deref() else {
            return Ok(());
        };
        let resp = self.send("root", Method::GET, "", |req| req).await?;
        let resp = check_status(resp).await?;
        let info: RootInfo = resp.json().await?;
        if info.cluster_name != expected {
            return Err(ElasticError::Config(format!(
                "expected cluster '{}', connected to '{}'",
                expected, info.cluster_name
            )));
        }
        debug!(cluster = %expected, "Cluster name verified");
        Ok(())
    }

    /// Send a request to the first reachable node
    async fn send<F>(&self, op: &str, method: Method, path: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut last_err = None;
        for base in &self.base_urls {
            let url = format!("{}/{}", base, path);
            let req = build(self.client.request(method.clone(), &url));
            match req.send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(node = %base, op = %op, error = %e, "Node unreachable, trying next");
                    last_err = Some(ElasticError::from(e));
                }
                Err(e) => {
                    let err = ElasticError::from(e);
                    metrics::record_admin_error(op, err.error_type());
                    return Err(err);
                }
            }
        }
        let err = last_err
            .unwrap_or_else(|| ElasticError::Connection("no nodes defined".to_string()));
        metrics::record_admin_error(op, err.error_type());
        Err(err)
    }
}

/// Turn a non-success response into a cluster error
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ElasticError::cluster(status.as_u16(), body))
}

#[async_trait]
impl IndexAdmin for HttpIndexAdmin {
    async fn exists(&self, name: &str) -> Result<bool> {
        let resp = self.send("exists", Method::HEAD, name, |req| req).await?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                metrics::record_admin_error("exists", "cluster");
                Err(ElasticError::cluster(
                    status.as_u16(),
                    format!("unexpected status checking index {}", name),
                ))
            }
        }
    }

    async fn create_index(&self, name: &str, mapping: &Value) -> Result<()> {
        let resp = self
            .send("create_index", Method::PUT, name, |req| req.json(mapping))
            .await?;
        check_status(resp).await.inspect_err(|e| {
            metrics::record_admin_error("create_index", e.error_type());
        })?;
        debug!(index = %name, "Index created");
        Ok(())
    }

    async fn create_alias(&self, index: &str, alias: &str) -> Result<()> {
        let body = json!({
            "actions": [{ "add": { "index": index, "alias": alias } }]
        });
        let resp = self
            .send("create_alias", Method::POST, "_aliases", |req| req.json(&body))
            .await?;
        check_status(resp).await.inspect_err(|e| {
            metrics::record_admin_error("create_alias", e.error_type());
        })?;
        debug!(index = %index, alias = %alias, "Alias created");
        Ok(())
    }

    async fn list_index_names(&self) -> Result<BTreeSet<String>> {
        let resp = self
            .send("list_indices", Method::GET, "_cat/indices", |req| {
                req.query(&[
                    ("format", "json"),
                    ("h", "index"),
                    ("expand_wildcards", "all"),
                ])
            })
            .await?;
        let resp = check_status(resp).await.inspect_err(|e| {
            metrics::record_admin_error("list_indices", e.error_type());
        })?;
        let rows: Vec<CatIndex> = resp.json().await?;
        Ok(rows.into_iter().map(|row| row.index).collect())
    }

    async fn verify_cluster(&self) -> Result<()> {
        self.verify_cluster_name().await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// Connector producing [`HttpIndexAdmin`] instances
#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn IndexAdmin>> {
        let admin = HttpIndexAdmin::new(settings)?;
        info!(
            nodes = ?admin.base_urls(),
            transport_port = settings.transport_port,
            cluster = settings.cluster_name.as_deref().unwrap_or("<default>"),
            "Opened cluster connection"
        );
        Ok(Arc::new(admin))
    }
}
