//! Structured error types for the pipeline (spec.md §7).
//!
//! One enum per concern, mirrored from the teacher's split of `IndexError` /
//! `ParseError` / `StorageError` (`examples/bartolli-codanna/src/error.rs`).
//! `ResolveAmbiguity` from spec.md's error table is deliberately *not* a
//! variant here: per spec.md it "is not an error; emits multiple edges with
//! reduced confidence" — it's data, handled entirely inside the call/import/
//! type resolvers.

use crate::graph::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error surfaced by [`crate::pipeline::Pipeline::run`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read repository root '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("encoder failed for symbol {id}: {reason}")]
    Encoder { id: NodeId, reason: String },

    #[error("pipeline cancelled during phase '{phase}'")]
    Cancelled { phase: &'static str },

    #[error("storage backend failed: {0}")]
    Storage(#[from] StorageError),
}

/// Per-file parse failure (spec.md §7: "the File node is kept, its symbols
/// are empty, a `parse_failed=true` property is set" — so this type never
/// aborts the pipeline, it's only ever logged and recorded on the node).
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("syntax error at line {line}, column {column}: {reason}")]
    Syntax { line: u32, column: u32, reason: String },

    #[error("invalid UTF-8 in source file")]
    InvalidUtf8,

    #[error("binary content, not a text source file")]
    Binary,
}

/// Errors the storage-backend contract (spec.md §6) may surface. The core
/// never constructs these beyond this shape — backends are external
/// collaborators and return their own `source` wrapped here.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to upsert {count} {kind} node(s): {source}")]
    UpsertNodes {
        kind: &'static str,
        count: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to upsert {count} {kind} edge(s): {source}")]
    UpsertEdges {
        kind: &'static str,
        count: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to (re)create index: {0}")]
    Index(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write metadata to '{path}': {source}")]
    Meta {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Defensive invariant checks (spec.md §8), never expected to fire in
/// correct code but kept as a concrete error rather than a panic so a
/// calling test can assert on it.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("node '{0}' referenced but not present in the graph")]
    DanglingReference(NodeId),

    #[error("confidence {0} outside [0,1]")]
    ConfidenceOutOfRange(f32),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type StorageResult<T> = Result<T, StorageError>;
