//! Error types for cluster connection and index reconciliation

use thiserror::Error;

/// Errors that can occur while talking to the search cluster
#[derive(Error, Debug)]
pub enum ElasticError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cluster responded with {status}: {reason}")]
    Cluster { status: u16, reason: String },

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No live cluster connection")]
    NotConnected,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ElasticError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            ElasticError::Config(_) => "config",
            ElasticError::Connection(_) => "connection",
            ElasticError::Transport(_) => "transport",
            ElasticError::Cluster { .. } => "cluster",
            ElasticError::Mapping(_) => "mapping",
            ElasticError::Serialization(_) => "serialization",
            ElasticError::NotConnected => "not_connected",
            ElasticError::Internal(_) => "internal",
        }
    }

    /// Build a cluster error from an HTTP status and response body
    pub fn cluster(status: u16, reason: impl Into<String>) -> Self {
        ElasticError::Cluster {
            status,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ElasticError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ElasticError::Connection(err.to_string())
        } else {
            ElasticError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ElasticError {
    fn from(err: serde_json::Error) -> Self {
        ElasticError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ElasticError {
    fn from(err: std::io::Error) -> Self {
        ElasticError::Transport(err.to_string())
    }
}

impl From<toml::de::Error> for ElasticError {
    fn from(err: toml::de::Error) -> Self {
        ElasticError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ElasticError>;
