//! Heritage resolver (spec.md §4.6): turns each class's syntactic base list
//! into EXTENDS (base resolves to a Class) or IMPLEMENTS (base resolves to
//! an Interface) edges. Unresolved bases — third-party or cross-language —
//! are dropped silently, same as a bare import specifier.

use crate::graph::{Edge, EdgeKind, KnowledgeGraph, NodeId, NodeKind, SymbolDetail};
use std::collections::HashMap;

pub fn resolve_heritage(graph: &mut KnowledgeGraph) {
    let mut by_name: HashMap<String, Vec<(NodeId, NodeKind)>> = HashMap::new();
    for node in graph.symbols() {
        if matches!(node.kind, NodeKind::Class | NodeKind::Interface) {
            if let Some(symbol) = node.as_symbol() {
                by_name.entry(symbol.name.clone()).or_default().push((node.id.clone(), node.kind));
            }
        }
    }

    let mut new_edges = Vec::new();
    for node in graph.nodes_of_kind(NodeKind::Class) {
        let Some(symbol) = node.as_symbol() else { continue };
        let SymbolDetail::Class { bases_syntactic } = &symbol.detail else { continue };
        for base in bases_syntactic {
            let simple = base.rsplit('.').next().unwrap_or(base);
            let Some(candidates) = by_name.get(simple) else { continue };
            // Multiple same-named candidates across files: heritage has no
            // cross-file disambiguation signal, so skip rather than guess.
            if candidates.len() != 1 {
                continue;
            }
            let (target_id, target_kind) = &candidates[0];
            if target_id == &node.id {
                continue;
            }
            let kind = match target_kind {
                NodeKind::Class => EdgeKind::Extends,
                NodeKind::Interface => EdgeKind::Implements,
                _ => continue,
            };
            new_edges.push(Edge::plain(node.id.clone(), target_id.clone(), kind));
        }
    }

    for edge in new_edges {
        graph.add_edge(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FilePayload, Node, NodePayload, SymbolPayload};
    use crate::types::Range;

    fn class_node(rel_path: &str, name: &str, bases: Vec<&str>) -> Node {
        Node {
            id: NodeId::symbol(NodeKind::Class, rel_path, name),
            kind: NodeKind::Class,
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
                detail: SymbolDetail::Class { bases_syntactic: bases.into_iter().map(String::from).collect() },
            }),
        }
    }

    fn interface_node(rel_path: &str, name: &str) -> Node {
        Node {
            id: NodeId::symbol(NodeKind::Interface, rel_path, name),
            kind: NodeKind::Interface,
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
                detail: SymbolDetail::Interface { methods_declared: Vec::new() },
            }),
        }
    }

    #[test]
    fn class_extends_class_and_implements_interface() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("a.cs"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "a.cs".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(interface_node("a.cs", "IRepository"));
        graph.upsert_node(class_node("a.cs", "BaseService", vec![]));
        graph.upsert_node(class_node("a.cs", "UserService", vec!["BaseService", "IRepository"]));

        resolve_heritage(&mut graph);

        let user_id = NodeId::symbol(NodeKind::Class, "a.cs", "UserService");
        let base_id = NodeId::symbol(NodeKind::Class, "a.cs", "BaseService");
        let iface_id = NodeId::symbol(NodeKind::Interface, "a.cs", "IRepository");
        assert!(graph.has_edge(&user_id, &base_id, EdgeKind::Extends));
        assert!(graph.has_edge(&user_id, &iface_id, EdgeKind::Implements));
    }

    #[test]
    fn unresolved_base_is_dropped_silently() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(class_node("a.py", "Dog", vec!["Animal"]));
        resolve_heritage(&mut graph);
        assert_eq!(graph.edges().len(), 0);
    }
}
