//! Reference [`StorageBackend`] used by this crate's own round-trip tests
//! (spec.md §8). Not a production backend: a real deployment plugs in a
//! graph database or hybrid search index; this one just proves the trait's
//! contract is satisfiable and that nodes/edges survive a save/reload cycle.
//!
//! Grounded on the teacher's atomic-write pattern
//! (`examples/bartolli-codanna/src/storage/persistence.rs`): write to a
//! `.tmp` sibling, then `rename` over the final path so a crash mid-write
//! never leaves a half-written file behind.

use super::{MetaJson, StorageBackend, VectorMetric};
use crate::error::StorageError;
use crate::graph::{Edge, EdgeKind, Node, NodeKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct JsonStorage {
    dir: PathBuf,
    nodes: HashMap<NodeKind, Vec<Node>>,
    edges: HashMap<EdgeKind, Vec<Edge>>,
    fts_indexes: Vec<(NodeKind, Vec<String>)>,
    vector_indexes: Vec<(NodeKind, String, usize, VectorMetric)>,
}

impl JsonStorage {
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            fts_indexes: Vec::new(),
            vector_indexes: Vec::new(),
        }
    }

    fn write_atomic(&self, name: &str, body: &[u8]) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)
    }

    /// Reload nodes and edges previously flushed by [`JsonStorage::flush`].
    /// Used by round-trip tests; real backends would query their own store.
    pub fn reload(dir: impl AsRef<Path>) -> Result<(Vec<Node>, Vec<Edge>), StorageError> {
        let dir = dir.as_ref();
        let nodes_path = dir.join("nodes.json");
        let edges_path = dir.join("edges.json");
        let nodes_body = std::fs::read(&nodes_path)
            .map_err(|source| StorageError::Meta { path: nodes_path.clone(), source })?;
        let edges_body = std::fs::read(&edges_path)
            .map_err(|source| StorageError::Meta { path: edges_path.clone(), source })?;
        let nodes: Vec<Node> = serde_json::from_slice(&nodes_body)
            .map_err(|e| StorageError::Meta { path: nodes_path, source: std::io::Error::other(e) })?;
        let edges: Vec<Edge> = serde_json::from_slice(&edges_body)
            .map_err(|e| StorageError::Meta { path: edges_path, source: std::io::Error::other(e) })?;
        Ok((nodes, edges))
    }

    /// Flush every buffered node/edge to `nodes.json`/`edges.json`. Upserts
    /// only stage in memory; nothing touches disk until this is called.
    pub fn flush(&self) -> Result<(), StorageError> {
        let all_nodes: Vec<&Node> = self.nodes.values().flatten().collect();
        let all_edges: Vec<&Edge> = self.edges.values().flatten().collect();
        let nodes_body = serde_json::to_vec_pretty(&all_nodes)
            .map_err(|e| StorageError::Meta { path: self.dir.join("nodes.json"), source: std::io::Error::other(e) })?;
        let edges_body = serde_json::to_vec_pretty(&all_edges)
            .map_err(|e| StorageError::Meta { path: self.dir.join("edges.json"), source: std::io::Error::other(e) })?;
        self.write_atomic("nodes.json", &nodes_body)
            .map_err(|source| StorageError::Meta { path: self.dir.join("nodes.json"), source })?;
        self.write_atomic("edges.json", &edges_body)
            .map_err(|source| StorageError::Meta { path: self.dir.join("edges.json"), source })?;
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn upsert_nodes(&mut self, kind: NodeKind, rows: &[Node]) -> Result<(), StorageError> {
        let bucket = self.nodes.entry(kind).or_default();
        for row in rows {
            if let Some(existing) = bucket.iter_mut().find(|n| n.id == row.id) {
                *existing = row.clone();
            } else {
                bucket.push(row.clone());
            }
        }
        Ok(())
    }

    fn upsert_edges(&mut self, kind: EdgeKind, rows: &[Edge]) -> Result<(), StorageError> {
        let bucket = self.edges.entry(kind).or_default();
        for row in rows {
            let dup = bucket
                .iter_mut()
                .find(|e| e.source == row.source && e.target == row.target && e.kind == row.kind);
            match dup {
                Some(existing) => *existing = row.clone(),
                None => bucket.push(row.clone()),
            }
        }
        Ok(())
    }

    fn create_fts_index(&mut self, kind: NodeKind, fields: &[&str]) -> Result<(), StorageError> {
        self.fts_indexes
            .retain(|(k, _)| *k != kind);
        self.fts_indexes.push((kind, fields.iter().map(|s| s.to_string()).collect()));
        Ok(())
    }

    fn create_vector_index(
        &mut self,
        kind: NodeKind,
        field: &str,
        dim: usize,
        metric: VectorMetric,
    ) -> Result<(), StorageError> {
        self.vector_indexes.retain(|(k, f, ..)| !(*k == kind && f.as_str() == field));
        self.vector_indexes.push((kind, field.to_string(), dim, metric));
        Ok(())
    }

    fn query_cypher(&self, _text: &str, _params: &serde_json::Value) -> Result<Vec<serde_json::Value>, StorageError> {
        Err(StorageError::Query(
            "query_cypher is not supported by the JSON reference backend".into(),
        ))
    }

    fn write_meta(&mut self, meta: &MetaJson) -> Result<(), StorageError> {
        meta.write_atomic(&self.dir)
    }

    fn storage_dir(&self) -> PathBuf {
        self.dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FolderPayload, NodePayload};
    use tempfile::TempDir;

    fn folder_node(path: &str) -> Node {
        Node {
            id: crate::graph::NodeId::folder(path),
            kind: NodeKind::Folder,
            payload: NodePayload::Folder(FolderPayload { path: path.to_string() }),
        }
    }

    #[test]
    fn upsert_is_idempotent_by_id() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStorage::open(dir.path());
        store.upsert_nodes(NodeKind::Folder, &[folder_node("src")]).unwrap();
        store.upsert_nodes(NodeKind::Folder, &[folder_node("src")]).unwrap();
        assert_eq!(store.nodes.get(&NodeKind::Folder).unwrap().len(), 1);
    }

    #[test]
    fn flush_then_reload_round_trips_nodes() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStorage::open(dir.path());
        store.upsert_nodes(NodeKind::Folder, &[folder_node("src"), folder_node("src/lib")]).unwrap();
        store.flush().unwrap();

        let (nodes, edges) = JsonStorage::reload(dir.path()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(edges.is_empty());
    }

    #[test]
    fn query_cypher_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let store = JsonStorage::open(dir.path());
        let result = store.query_cypher("MATCH (n) RETURN n", &serde_json::Value::Null);
        assert!(result.is_err());
    }

    #[test]
    fn meta_write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStorage::open(dir.path());
        let mut meta = MetaJson { schema_version: 1, ..Default::default() };
        meta.node_counts.insert("folder".to_string(), 2);
        store.write_meta(&meta).unwrap();

        let reloaded = MetaJson::read(&dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.schema_version, 1);
        assert_eq!(reloaded.node_counts.get("folder"), Some(&2));
    }
}
