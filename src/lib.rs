//! axon — ingests a source repository and persists a queryable knowledge
//! graph of its symbols and relationships.
//!
//! The crate is organized as a linear, phase-sequential pipeline
//! (see [`pipeline`]) that reads and mutates a shared [`graph::KnowledgeGraph`]
//! value. Storage-backend implementations, the agent-facing RPC surface, the
//! hybrid search engine, and the embedding backend are external collaborators;
//! this crate only defines the contracts they must satisfy
//! ([`storage::StorageBackend`], [`pipeline::embedding::Encoder`]).

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod parsing;
pub mod pipeline;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{GraphError, ParseError, PipelineError, StorageError};
pub use graph::{Edge, EdgeKind, KnowledgeGraph, Node, NodeId, NodeKind};
pub use pipeline::{CancellationToken, Pipeline, PipelineMetrics};
pub use types::{Confidence, Range, TypeRole};
