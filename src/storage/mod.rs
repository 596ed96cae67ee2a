//! The storage-backend contract (spec.md §6).
//!
//! Real backend implementations (a graph database, a hybrid search index,
//! etc.) are external collaborators and out of scope for this crate; this
//! module only defines the trait they satisfy, the `.axon/meta.json` schema
//! the core writes alongside any backend's opaque files, and a small
//! reference JSON implementation used by this crate's own round-trip tests
//! (spec.md §8 "Parse → serialize → reload → query").

mod json_store;

pub use json_store::JsonStorage;

use crate::error::StorageResult;
use crate::graph::{Edge, EdgeKind, Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorMetric {
    Cosine,
}

/// `.axon/meta.json` (spec.md §6): schema version, commit hash indexed,
/// phase timings, counts per node/edge kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaJson {
    pub schema_version: u32,
    pub commit_hash: Option<String>,
    pub phase_timings_ms: HashMap<String, f64>,
    pub node_counts: HashMap<String, usize>,
    pub edge_counts: HashMap<String, usize>,
}

impl MetaJson {
    pub fn write_atomic(&self, axon_dir: &std::path::Path) -> StorageResult<()> {
        use crate::error::StorageError;
        std::fs::create_dir_all(axon_dir).map_err(|source| StorageError::Meta {
            path: axon_dir.to_path_buf(),
            source,
        })?;
        let path = axon_dir.join("meta.json");
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(self)
            .map_err(|e| StorageError::Meta { path: path.clone(), source: std::io::Error::other(e) })?;
        std::fs::write(&tmp, body).map_err(|source| StorageError::Meta { path: tmp.clone(), source })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Meta { path, source })
    }

    pub fn read(axon_dir: &std::path::Path) -> StorageResult<Self> {
        use crate::error::StorageError;
        let path = axon_dir.join("meta.json");
        let body = std::fs::read(&path).map_err(|source| StorageError::Meta { path: path.clone(), source })?;
        serde_json::from_slice(&body).map_err(|e| StorageError::Meta { path, source: std::io::Error::other(e) })
    }
}

/// One row as the backend sees it: the node/edge plus the kind it was
/// grouped under, so `upsert_nodes`/`upsert_edges` can batch per kind the
/// way spec.md §6 describes ("one row per kind" — spec.md §9 design note).
pub trait StorageBackend {
    /// Idempotent by node id.
    fn upsert_nodes(&mut self, kind: NodeKind, rows: &[Node]) -> StorageResult<()>;

    /// Idempotent by (source, target, type, role?).
    fn upsert_edges(&mut self, kind: EdgeKind, rows: &[Edge]) -> StorageResult<()>;

    /// Re-creatable full-text index over the named fields of a node kind.
    fn create_fts_index(&mut self, kind: NodeKind, fields: &[&str]) -> StorageResult<()>;

    /// Re-creatable vector index over a single field of a node kind.
    fn create_vector_index(
        &mut self,
        kind: NodeKind,
        field: &str,
        dim: usize,
        metric: VectorMetric,
    ) -> StorageResult<()>;

    /// Read-only graph query. The core never relies on a particular query
    /// language surviving across backends; this is a pass-through.
    fn query_cypher(&self, text: &str, params: &serde_json::Value) -> StorageResult<Vec<serde_json::Value>>;

    fn write_meta(&mut self, meta: &MetaJson) -> StorageResult<()>;

    fn storage_dir(&self) -> PathBuf;
}
