//! Dead-code analyzer (spec.md §4.10): five-pass `is_dead` flagging.
//! Grounded on the teacher's multi-pass shape for derived analyses
//! (`examples/bartolli-codanna`'s staged indexing passes), generalized to
//! the five exemption/override/protocol rules this spec names.

use crate::graph::{EdgeKind, KnowledgeGraph, NodeId, NodeKind, SymbolDetail};
use std::collections::{HashMap, HashSet};

pub fn flag_dead_code(graph: &mut KnowledgeGraph) {
    let callable: Vec<NodeId> = graph
        .symbols()
        .filter(|n| matches!(n.kind, NodeKind::Function | NodeKind::Method))
        .map(|n| n.id.clone())
        .collect();

    let imported_files: HashSet<NodeId> = graph.edges().iter().filter(|e| e.kind == EdgeKind::Imports).map(|e| e.target.clone()).collect();

    // Pass 1: initial candidate-dead.
    let mut dead: HashSet<NodeId> = HashSet::new();
    for id in &callable {
        let has_callers = graph.edges_to(id, EdgeKind::Calls).next().is_some();
        let file_imported = graph.node(id).and_then(|n| n.as_symbol()).map(|s| imported_files.contains(&s.file)).unwrap_or(false);
        if !has_callers && !file_imported {
            dead.insert(id.clone());
        }
    }

    // Pass 2: exemptions.
    let entry_ids: HashSet<NodeId> = graph.nodes_of_kind(NodeKind::Process).filter_map(|n| match &n.payload {
        crate::graph::NodePayload::Process(p) => Some(p.entry_symbol_id.clone()),
        _ => None,
    }).collect();

    dead.retain(|id| {
        let Some(symbol) = graph.node(id).and_then(|n| n.as_symbol()) else { return false };
        let is_dunder = symbol.name.starts_with("__") && symbol.name.ends_with("__");
        let in_init_file = graph.node(&symbol.file).and_then(|f| f.as_file()).map(|f| {
            let base = f.path.rsplit('/').next().unwrap_or(&f.path);
            base.starts_with("__init__.")
        }).unwrap_or(false);
        let in_test_file = graph.node(&symbol.file).and_then(|f| f.as_file()).map(|f| f.path.contains("test")).unwrap_or(false);
        let is_ctor = matches!(&symbol.detail, SymbolDetail::Method { is_ctor: true, .. });

        let exempt = entry_ids.contains(id)
            || symbol.is_exported
            || is_ctor
            || is_dunder
            || in_init_file
            || symbol.is_test
            || in_test_file
            || !symbol.decorators.is_empty()
            || is_property(&symbol.detail);

        !exempt
    });

    // Pass 3: override of a non-dead ancestor method (name + arity match).
    let method_arity: HashMap<NodeId, usize> = graph
        .symbols()
        .filter(|n| n.kind == NodeKind::Method)
        .filter_map(|n| n.as_symbol().map(|s| (n.id.clone(), s.param_types.len())))
        .collect();

    dead.retain(|id| {
        let Some(symbol) = graph.node(id).and_then(|n| n.as_symbol()) else { return false };
        let SymbolDetail::Method { owner_id, is_override, .. } = &symbol.detail else { return true };
        if !is_override {
            return true;
        }
        let arity = method_arity.get(id).copied().unwrap_or(0);
        let overrides_live_ancestor = graph
            .edges_from(owner_id, EdgeKind::Extends)
            .filter_map(|e| ancestor_method(graph, &e.target, &symbol.name, arity))
            .any(|ancestor| !dead.contains(&ancestor));
        !overrides_live_ancestor
    });

    // Pass 4: protocol conformance — method on a class that IMPLEMENTS an
    // Interface declaring that method name.
    dead.retain(|id| {
        let Some(symbol) = graph.node(id).and_then(|n| n.as_symbol()) else { return false };
        let SymbolDetail::Method { owner_id, .. } = &symbol.detail else { return true };
        let conforms = graph.edges_from(owner_id, EdgeKind::Implements).any(|e| {
            graph
                .node(&e.target)
                .and_then(|n| n.as_symbol())
                .map(|iface| matches!(&iface.detail, SymbolDetail::Interface { methods_declared } if methods_declared.contains(&symbol.name)))
                .unwrap_or(false)
        });
        !conforms
    });

    // Pass 5: protocol stubs — every method declared directly on an
    // Interface node is never dead. Run last: this overrides any earlier
    // pass that might have flagged a stub (spec.md §9 known-issue note).
    dead.retain(|id| graph.node(id).and_then(|n| n.as_symbol()).map(|s| !matches!(&s.detail, SymbolDetail::Method { is_stub: true, .. })).unwrap_or(true));

    for id in &callable {
        if let Some(node) = graph.node_mut(id) {
            if let Some(symbol) = node.as_symbol_mut() {
                symbol.is_dead = dead.contains(id);
            }
        }
    }
}

fn is_property(detail: &SymbolDetail) -> bool {
    matches!(detail, SymbolDetail::Method { is_property: true, .. })
}

fn ancestor_method(graph: &KnowledgeGraph, owner_id: &NodeId, name: &str, arity: usize) -> Option<NodeId> {
    graph
        .symbols()
        .find(|n| {
            n.as_symbol()
                .map(|s| {
                    s.name == name
                        && s.param_types.len() == arity
                        && matches!(&s.detail, SymbolDetail::Method { owner_id: o, .. } if o == owner_id)
                })
                .unwrap_or(false)
        })
        .map(|n| n.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeProps, FilePayload, Node, NodePayload, SymbolPayload};
    use crate::types::{Confidence, Range};

    fn function(rel_path: &str, name: &str, is_exported: bool) -> Node {
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
                is_exported,
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
    fn uncalled_unexported_function_is_flagged_dead() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("a.py"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "a.py".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(function("a.py", "unused", false));

        flag_dead_code(&mut graph);

        let id = NodeId::symbol(NodeKind::Function, "a.py", "unused");
        assert!(graph.node(&id).unwrap().as_symbol().unwrap().is_dead);
    }

    #[test]
    fn called_function_is_not_dead() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("a.py"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "a.py".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(function("a.py", "main", false));
        graph.upsert_node(function("a.py", "helper", false));
        let main_id = NodeId::symbol(NodeKind::Function, "a.py", "main");
        let helper_id = NodeId::symbol(NodeKind::Function, "a.py", "helper");
        graph.add_edge(Edge::new(main_id, helper_id.clone(), EdgeKind::Calls, EdgeProps::Calls { confidence: Confidence::UNIQUE_LOCAL }));

        flag_dead_code(&mut graph);
        assert!(!graph.node(&helper_id).unwrap().as_symbol().unwrap().is_dead);
    }

    #[test]
    fn exported_function_is_exempt_even_if_uncalled() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node { id: NodeId::file("a.py"), kind: NodeKind::File, payload: NodePayload::File(FilePayload { path: "a.py".into(), language: None, byte_size: 0, hash: String::new(), parse_failed: false }) });
        graph.upsert_node(function("a.py", "public_api", true));

        flag_dead_code(&mut graph);
        let id = NodeId::symbol(NodeKind::Function, "a.py", "public_api");
        assert!(!graph.node(&id).unwrap().as_symbol().unwrap().is_dead);
    }
}
