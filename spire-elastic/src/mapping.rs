//! Index mapping documents
//!
//! The mapping document is opaque to this crate; it is sent verbatim as the
//! body of the create-index request.

use crate::error::{ElasticError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Source of the create-index body
pub trait MappingSource: Send + Sync {
    fn read_mapping(&self) -> Result<Value>;
}

/// Reads the mapping from a JSON file on every call
#[derive(Debug, Clone)]
pub struct FileMappingSource {
    path: PathBuf,
}

impl FileMappingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MappingSource for FileMappingSource {
    fn read_mapping(&self) -> Result<Value> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ElasticError::Mapping(format!("{}: {}", self.path.display(), e))
        })?;
        let doc: Value = serde_json::from_str(&content).map_err(|e| {
            ElasticError::Mapping(format!("{}: {}", self.path.display(), e))
        })?;
        if !doc.is_object() {
            return Err(ElasticError::Mapping(format!(
                "{}: expected a JSON object",
                self.path.display()
            )));
        }
        Ok(doc)
    }
}

/// Fixed, in-memory mapping document
#[derive(Debug, Clone, Default)]
pub struct StaticMappingSource {
    doc: Value,
}

impl StaticMappingSource {
    pub fn new(doc: Value) -> Self {
        Self { doc }
    }

    /// An empty `{}` body, letting the cluster infer mappings
    pub fn empty() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

impl MappingSource for StaticMappingSource {
    fn read_mapping(&self) -> Result<Value> {
        Ok(self.doc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_file_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, r#"{"mappings":{"properties":{"title":{"type":"text"}}}}"#)
            .unwrap();

        let doc = FileMappingSource::new(&path).read_mapping().unwrap();
        assert_eq!(doc["mappings"]["properties"]["title"]["type"], "text");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = FileMappingSource::new(dir.path().join("nope.json"))
            .read_mapping()
            .unwrap_err();
        assert!(matches!(err, ElasticError::Mapping(_)));
    }

    #[test]
    fn test_not_an_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = FileMappingSource::new(&path).read_mapping().unwrap_err();
        assert!(matches!(err, ElasticError::Mapping(_)));
    }

    #[test]
    fn test_static_mapping() {
        let source = StaticMappingSource::new(json!({"settings": {"number_of_shards": 1}}));
        assert_eq!(source.read_mapping().unwrap()["settings"]["number_of_shards"], 1);
        assert_eq!(StaticMappingSource::empty().read_mapping().unwrap(), json!({}));
    }
}
