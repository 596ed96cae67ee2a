//! Community detector (spec.md §4.8): groups symbols into cohesive clusters
//! over the CALLS ∪ USES_TYPE ∪ EXTENDS ∪ IMPLEMENTS adjacency. No Leiden or
//! Louvain crate exists anywhere in the pack's dependency set, so this is a
//! single-level greedy label-propagation pass (each node adopts whichever
//! neighboring label is most common, repeated to a fixed point or an
//! iteration cap) rather than the hierarchical original algorithm.

use crate::graph::{CommunityPayload, KnowledgeGraph, Node, NodeId, NodeKind, NodePayload};
use std::collections::HashMap;

const MAX_ITERATIONS: usize = 20;

pub fn detect_communities(graph: &mut KnowledgeGraph) {
    let adjacency = graph.symbol_adjacency();
    if adjacency.is_empty() {
        return;
    }

    let labels = propagate_labels(&adjacency);
    let mut members: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (node_id, label) in &labels {
        members.entry(label.clone()).or_default().push(node_id.clone());
    }

    let mut new_nodes = Vec::new();
    let mut contains_edges: Vec<(NodeId, NodeId)> = Vec::new();

    for (label, nodes) in members {
        if nodes.len() < 2 {
            // Singleton symbols fall into a synthetic catch-all community
            // rather than each minting their own cohesion-1.0 cluster.
            continue;
        }
        let cohesion = cohesion_score(&nodes, &adjacency);
        let community_id = NodeId::fresh(NodeKind::Community);
        let label_text = common_path_prefix(graph, &nodes).unwrap_or_else(|| label.to_string());
        new_nodes.push(Node {
            id: community_id.clone(),
            kind: NodeKind::Community,
            payload: NodePayload::Community(CommunityPayload { label: label_text, cohesion }),
        });
        for member in nodes {
            contains_edges.push((community_id.clone(), member));
        }
    }

    let singletons: Vec<NodeId> = labels
        .iter()
        .filter(|(_, label)| members_len(&labels, label) == 1)
        .map(|(id, _)| id.clone())
        .collect();
    if !singletons.is_empty() {
        let misc_id = NodeId::fresh(NodeKind::Community);
        new_nodes.push(Node {
            id: misc_id.clone(),
            kind: NodeKind::Community,
            payload: NodePayload::Community(CommunityPayload { label: "misc".to_string(), cohesion: 0.0 }),
        });
        for member in singletons {
            contains_edges.push((misc_id.clone(), member));
        }
    }

    for node in new_nodes {
        graph.upsert_node(node);
    }
    for (community, member) in contains_edges {
        graph.add_edge(crate::graph::Edge::plain(member, community, crate::graph::EdgeKind::MemberOf));
    }
}

fn members_len(labels: &HashMap<NodeId, NodeId>, target: &NodeId) -> usize {
    labels.values().filter(|l| *l == target).count()
}

fn propagate_labels(adjacency: &HashMap<NodeId, Vec<NodeId>>) -> HashMap<NodeId, NodeId> {
    let mut labels: HashMap<NodeId, NodeId> = adjacency.keys().map(|id| (id.clone(), id.clone())).collect();
    let mut order: Vec<NodeId> = adjacency.keys().cloned().collect();
    order.sort();

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for node in &order {
            let Some(neighbors) = adjacency.get(node) else { continue };
            if neighbors.is_empty() {
                continue;
            }
            let mut counts: HashMap<&NodeId, usize> = HashMap::new();
            for neighbor in neighbors {
                if let Some(label) = labels.get(neighbor) {
                    *counts.entry(label).or_insert(0) += 1;
                }
            }
            if let Some((best, _)) = counts.into_iter().max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0))) {
                if labels.get(node) != Some(best) {
                    labels.insert(node.clone(), best.clone());
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    labels
}

fn cohesion_score(members: &[NodeId], adjacency: &HashMap<NodeId, Vec<NodeId>>) -> f32 {
    let set: std::collections::HashSet<&NodeId> = members.iter().collect();
    let mut internal = 0usize;
    let mut boundary = 0usize;
    for member in members {
        let Some(neighbors) = adjacency.get(member) else { continue };
        for neighbor in neighbors {
            if set.contains(neighbor) {
                internal += 1;
            } else {
                boundary += 1;
            }
        }
    }
    if internal + boundary == 0 {
        0.0
    } else {
        internal as f32 / (internal + boundary) as f32
    }
}

/// Label from the most-frequent two-segment path prefix among a community's
/// member files, e.g. `src/billing`.
fn common_path_prefix(graph: &KnowledgeGraph, members: &[NodeId]) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for member in members {
        let symbol = graph.node(member)?.as_symbol()?;
        let file = graph.node(&symbol.file)?.as_file()?;
        let segments: Vec<&str> = file.path.split('/').collect();
        let prefix = segments.iter().take(2).cloned().collect::<Vec<_>>().join("/");
        if !prefix.is_empty() {
            *counts.entry(prefix).or_insert(0) += 1;
        }
    }
    counts.into_iter().max_by_key(|(_, n)| *n).map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeKind, EdgeProps, FilePayload, SymbolDetail, SymbolPayload};
    use crate::types::{Confidence, Range};

    fn func(rel_path: &str, name: &str) -> Node {
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

    #[test]
    fn tightly_coupled_symbols_join_one_community() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("billing/a.py"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "billing/a.py".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(func("billing/a.py", "charge"));
        graph.upsert_node(func("billing/a.py", "refund"));

        let a = NodeId::symbol(NodeKind::Function, "billing/a.py", "charge");
        let b = NodeId::symbol(NodeKind::Function, "billing/a.py", "refund");
        graph.add_edge(Edge::new(a.clone(), b.clone(), EdgeKind::Calls, EdgeProps::Calls { confidence: Confidence::UNIQUE_LOCAL }));
        graph.add_edge(Edge::new(b.clone(), a.clone(), EdgeKind::Calls, EdgeProps::Calls { confidence: Confidence::UNIQUE_LOCAL }));

        detect_communities(&mut graph);

        let communities: Vec<_> = graph.nodes_of_kind(NodeKind::Community).collect();
        assert_eq!(communities.len(), 1);
    }
}
