//! REST admin backend tests.
//!
//! Each test starts a small Axum server that mimics the Elasticsearch index
//! admin endpoints, then drives it through `HttpIndexAdmin` and the full
//! `ElasticContext` startup path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use spire_elastic::{
    ConnectionSettings, ElasticConfig, ElasticContext, ElasticError, HttpConnector,
    HttpIndexAdmin, IndexAdmin, LifecycleState, StaticMappingSource,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeCluster {
    indices: BTreeMap<String, Value>,
    aliases: BTreeMap<String, String>,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<FakeCluster>>;

async fn root() -> Json<Value> {
    Json(json!({ "name": "node-1", "cluster_name": "test-cluster" }))
}

async fn head_index(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    let mut cluster = state.lock().unwrap();
    cluster.requests.push(format!("HEAD /{}", index));
    if cluster.indices.contains_key(&index) || cluster.aliases.contains_key(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn put_index(
    State(state): State<Shared>,
    Path(index): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut cluster = state.lock().unwrap();
    cluster.requests.push(format!("PUT /{}", index));
    if cluster.indices.contains_key(&index) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "type": "resource_already_exists_exception" }, "status": 400 })),
        );
    }
    cluster.indices.insert(index.clone(), body);
    (
        StatusCode::OK,
        Json(json!({ "acknowledged": true, "index": index })),
    )
}

async fn post_aliases(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut cluster = state.lock().unwrap();
    cluster.requests.push("POST /_aliases".to_string());
    for action in body["actions"].as_array().into_iter().flatten() {
        let add = &action["add"];
        let (Some(index), Some(alias)) = (add["index"].as_str(), add["alias"].as_str()) else {
            return StatusCode::BAD_REQUEST;
        };
        if !cluster.indices.contains_key(index) {
            return StatusCode::NOT_FOUND;
        }
        cluster.aliases.insert(alias.to_string(), index.to_string());
    }
    StatusCode::OK
}

async fn cat_indices(State(state): State<Shared>) -> Json<Value> {
    let mut cluster = state.lock().unwrap();
    cluster.requests.push("GET /_cat/indices".to_string());
    let rows: Vec<Value> = cluster
        .indices
        .keys()
        .map(|name| json!({ "index": name }))
        .collect();
    Json(Value::Array(rows))
}

/// Start the fake cluster on a random port and return its `host:port`.
async fn start_cluster(state: Shared) -> String {
    let router = Router::new()
        .route("/", get(root))
        .route("/_cat/indices", get(cat_indices))
        .route("/_aliases", post(post_aliases))
        .route("/:index", put(put_index).head(head_index))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    addr.to_string()
}

fn settings(nodes: Vec<String>, cluster_name: Option<&str>) -> ConnectionSettings {
    ConnectionSettings {
        nodes,
        transport_port: 9300,
        http_port: 9200,
        cluster_name: cluster_name.map(str::to_string),
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_exists_create_alias_list() {
    let state = Shared::default();
    let node = start_cluster(state.clone()).await;
    let admin = HttpIndexAdmin::new(&settings(vec![node], None)).unwrap();

    assert!(!admin.exists("metadata_v1").await.unwrap());
    admin
        .create_index("metadata_v1", &json!({ "mappings": { "properties": {} } }))
        .await
        .unwrap();
    admin.create_alias("metadata_v1", "metadata").await.unwrap();

    assert!(admin.exists("metadata").await.unwrap());
    let names = admin.list_index_names().await.unwrap();
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["metadata_v1"]);

    let cluster = state.lock().unwrap();
    assert_eq!(
        cluster.indices["metadata_v1"],
        json!({ "mappings": { "properties": {} } })
    );
    assert_eq!(cluster.aliases["metadata"], "metadata_v1");
}

#[tokio::test]
async fn test_cluster_error_carries_status() {
    let state = Shared::default();
    let node = start_cluster(state.clone()).await;
    let admin = HttpIndexAdmin::new(&settings(vec![node], None)).unwrap();

    admin.create_index("records", &json!({})).await.unwrap();
    let err = admin.create_index("records", &json!({})).await.unwrap_err();
    match err {
        ElasticError::Cluster { status, reason } => {
            assert_eq!(status, 400);
            assert!(reason.contains("resource_already_exists_exception"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fails_over_to_next_node() {
    let state = Shared::default();
    let node = start_cluster(state.clone()).await;

    // Nothing listens on port 1
    let admin =
        HttpIndexAdmin::new(&settings(vec!["127.0.0.1:1".to_string(), node], None)).unwrap();
    assert!(!admin.exists("metadata").await.unwrap());
    assert_eq!(state.lock().unwrap().requests, vec!["HEAD /metadata"]);
}

#[tokio::test]
async fn test_unreachable_cluster() {
    let admin = HttpIndexAdmin::new(&settings(vec!["127.0.0.1:1".to_string()], None)).unwrap();
    let err = admin.exists("metadata").await.unwrap_err();
    assert!(matches!(
        err,
        ElasticError::Connection(_) | ElasticError::Transport(_)
    ));
}

#[tokio::test]
async fn test_verify_cluster_name() {
    let state = Shared::default();
    let node = start_cluster(state).await;

    let admin =
        HttpIndexAdmin::new(&settings(vec![node.clone()], Some("test-cluster"))).unwrap();
    admin.verify_cluster().await.unwrap();

    let admin = HttpIndexAdmin::new(&settings(vec![node], Some("other"))).unwrap();
    assert!(matches!(
        admin.verify_cluster().await,
        Err(ElasticError::Config(_))
    ));
}

#[tokio::test]
async fn test_context_startup_over_http() {
    let state = Shared::default();
    state
        .lock()
        .unwrap()
        .indices
        .insert("metadata_v4".to_string(), json!({}));
    let node = start_cluster(state.clone()).await;

    let config = ElasticConfig {
        nodes: vec![format!(" {}, ", node)],
        auto_create_index: true,
        cluster_name: Some("test-cluster".into()),
        ..Default::default()
    };
    let context = ElasticContext::new(
        config,
        Arc::new(HttpConnector::new()),
        Arc::new(StaticMappingSource::empty()),
    );

    context.startup().await.unwrap();
    assert_eq!(context.state(), LifecycleState::Running);
    assert!(!context.has_pending_retry());
    context.check_cluster().await.unwrap();

    {
        let cluster = state.lock().unwrap();
        assert_eq!(cluster.aliases["metadata"], "metadata_v4");
        assert_eq!(
            cluster.requests,
            vec!["HEAD /metadata", "GET /_cat/indices", "POST /_aliases"]
        );
    }

    context.shutdown().await;
    assert!(!context.is_connected());
}
