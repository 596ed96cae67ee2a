//! Embedding generator (spec.md §4.12): calls an opaque encoder once per
//! symbol with `name + signature + body_snippet` as input and stores the
//! resulting vector on the node. Entirely skippable by configuration.

use crate::config::EmbeddingConfig;
use crate::graph::KnowledgeGraph;
use async_trait::async_trait;

/// `encode(batch) -> Vec<Option<vector>>`, spec.md §6: "may fail per-item,
/// in which case the node gets no vector."
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, batch: Vec<String>) -> Vec<Option<Vec<f32>>>;
}

/// No-op encoder used when no real collaborator is configured; every input
/// comes back unembedded rather than the phase failing.
pub struct NullEncoder;

#[async_trait]
impl Encoder for NullEncoder {
    async fn encode(&self, batch: Vec<String>) -> Vec<Option<Vec<f32>>> {
        vec![None; batch.len()]
    }
}

pub async fn generate_embeddings(graph: &mut KnowledgeGraph, config: &EmbeddingConfig, encoder: &dyn Encoder) {
    if !config.enabled {
        return;
    }

    let ids: Vec<_> = graph.symbols().map(|n| n.id.clone()).collect();
    let inputs: Vec<String> = ids
        .iter()
        .filter_map(|id| graph.node(id).and_then(|n| n.as_symbol()))
        .map(|s| format!("{} {} {}", s.name, s.signature.clone().unwrap_or_default(), s.body_snippet.clone().unwrap_or_default()))
        .collect();

    let vectors = encoder.encode(inputs).await;

    for (id, vector) in ids.into_iter().zip(vectors) {
        if let Some(vec) = vector {
            if vec.len() != config.dimensions {
                continue;
            }
            if let Some(node) = graph.node_mut(&id) {
                if let Some(symbol) = node.as_symbol_mut() {
                    symbol.embedding = Some(vec);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FilePayload, Node, NodeId, NodeKind, NodePayload, SymbolDetail, SymbolPayload};
    use crate::types::Range;

    struct FixedEncoder(Vec<f32>);

    #[async_trait]
    impl Encoder for FixedEncoder {
        async fn encode(&self, batch: Vec<String>) -> Vec<Option<Vec<f32>>> {
            vec![Some(self.0.clone()); batch.len()]
        }
    }

    fn function(rel_path: &str, name: &str) -> Node {
        Node {
            id: NodeId::symbol(NodeKind::Function, rel_path, name),
            kind: NodeKind::Function,
            payload: NodePayload::Symbol(SymbolPayload {
                name: name.into(),
                file: NodeId::file(rel_path),
                range: Range::new(1, 0, 1, 1),
                signature: None,
                body_snippet: None,
                decorators: Vec::new(),
                is_exported: true,
                is_default_export: false,
                is_test: false,
                is_dead: false,
                embedding: None,
                param_types: Vec::new(),
                return_type: None,
                variable_types: Vec::new(),
                detail: SymbolDetail::Function,
            }),
        }
    }

    #[tokio::test]
    async fn disabled_config_skips_encoding() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(function("a.py", "f"));
        let config = EmbeddingConfig { enabled: false, dimensions: 4 };
        generate_embeddings(&mut graph, &config, &NullEncoder).await;
        let id = NodeId::symbol(NodeKind::Function, "a.py", "f");
        assert!(graph.node(&id).unwrap().as_symbol().unwrap().embedding.is_none());
    }

    #[tokio::test]
    async fn matching_dimension_vector_is_stored() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("a.py"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "a.py".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(function("a.py", "f"));
        let config = EmbeddingConfig { enabled: true, dimensions: 3 };
        generate_embeddings(&mut graph, &config, &FixedEncoder(vec![0.1, 0.2, 0.3])).await;
        let id = NodeId::symbol(NodeKind::Function, "a.py", "f");
        assert_eq!(graph.node(&id).unwrap().as_symbol().unwrap().embedding, Some(vec![0.1, 0.2, 0.3]));
    }
}
