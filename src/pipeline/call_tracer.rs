//! Call tracer (spec.md §4.5): binds raw call sites to callee symbol ids
//! with a confidence score, consulting the blocklist first.

use crate::graph::{Edge, EdgeKind, EdgeProps, KnowledgeGraph, NodeId, NodeKind, SymbolDetail};
use crate::pipeline::blocklist;
use crate::pipeline::collect::CollectedFile;
use crate::types::Confidence;
use std::collections::HashMap;

const MAX_AMBIGUOUS_EDGES: usize = 3;
const FUZZY_MAX_DISTANCE: usize = 2;

struct GlobalIndex {
    /// Bare symbol name -> every Function/Method node with that name.
    by_name: HashMap<String, Vec<NodeId>>,
    /// (owning class/interface node id, bare method name) -> method node id.
    method_by_owner: HashMap<(NodeId, String), NodeId>,
    /// Bare class/interface name -> candidate owner node ids.
    class_by_name: HashMap<String, Vec<NodeId>>,
}

fn build_index(graph: &KnowledgeGraph) -> GlobalIndex {
    let mut by_name: HashMap<String, Vec<NodeId>> = HashMap::new();
    let mut method_by_owner: HashMap<(NodeId, String), NodeId> = HashMap::new();
    let mut class_by_name: HashMap<String, Vec<NodeId>> = HashMap::new();

    for node in graph.symbols() {
        let Some(symbol) = node.as_symbol() else { continue };
        if matches!(node.kind, NodeKind::Function | NodeKind::Method) {
            by_name.entry(symbol.name.clone()).or_default().push(node.id.clone());
        }
        if let SymbolDetail::Method { owner_id, .. } = &symbol.detail {
            method_by_owner.insert((owner_id.clone(), symbol.name.clone()), node.id.clone());
        }
        if matches!(node.kind, NodeKind::Class | NodeKind::Interface) {
            class_by_name.entry(symbol.name.clone()).or_default().push(node.id.clone());
        }
    }

    GlobalIndex { by_name, method_by_owner, class_by_name }
}

/// Caller's owning class name, if the caller is a method.
fn owner_class_name(graph: &KnowledgeGraph, caller_id: &NodeId) -> Option<String> {
    let caller = graph.node(caller_id)?.as_symbol()?;
    match &caller.detail {
        SymbolDetail::Method { owner_id, .. } => graph.node(owner_id)?.as_symbol().map(|s| s.name.clone()),
        _ => None,
    }
}

pub fn trace_calls(graph: &mut KnowledgeGraph, files: &[CollectedFile]) {
    let index = build_index(graph);
    let mut new_edges = Vec::new();

    for file in files {
        for call in &file.calls {
            if blocklist::is_blocked(&call.callee_name) {
                continue;
            }
            let Some(caller_id) = file.local_symbols.get(&call.caller_qualified_name).cloned() else { continue };

            let caller_class = owner_class_name(graph, &caller_id);
            let mut bindings = resolve_call(graph, &index, file, &caller_id, call);

            bindings.retain(|(target, _)| {
                if *target != caller_id {
                    return true;
                }
                match (&call.receiver_static_type, &caller_class) {
                    (Some(recv), Some(owner)) => recv != owner,
                    _ => false,
                }
            });

            for (target, confidence) in bindings {
                new_edges.push(Edge::new(caller_id.clone(), target, EdgeKind::Calls, EdgeProps::Calls { confidence }));
            }
        }
    }

    for edge in new_edges {
        graph.add_edge(edge);
    }
}

fn resolve_call(
    graph: &KnowledgeGraph,
    index: &GlobalIndex,
    file: &CollectedFile,
    caller_id: &NodeId,
    call: &crate::parsing::RawCallSite,
) -> Vec<(NodeId, Confidence)> {
    // Rule 1: unique symbol in the same file or an imported module.
    if let Some(id) = file.local_symbols.get(&call.callee_name) {
        return vec![(id.clone(), Confidence::UNIQUE_LOCAL)];
    }
    let imported_candidates: Vec<NodeId> = graph
        .edges_from(&file.file_id, EdgeKind::Imports)
        .filter(|e| matches!(&e.props, EdgeProps::Imports { symbols } if symbols.iter().any(|s| s == &call.callee_name)))
        .filter_map(|e| graph.node(&e.target))
        .flat_map(|target_file| {
            graph
                .edges_from(&target_file.id, EdgeKind::Defines)
                .filter_map(|d| graph.node(&d.target))
                .filter(|n| n.as_symbol().is_some_and(|s| s.name == call.callee_name))
                .map(|n| n.id.clone())
        })
        .collect();
    if imported_candidates.len() == 1 {
        return vec![(imported_candidates[0].clone(), Confidence::UNIQUE_LOCAL)];
    }

    // Rule 2: method resolved via known receiver type.
    if let Some(receiver_type) = &call.receiver_static_type {
        if let Some(owners) = index.class_by_name.get(receiver_type) {
            let hits: Vec<NodeId> = owners
                .iter()
                .filter_map(|owner| index.method_by_owner.get(&(owner.clone(), call.callee_name.clone())))
                .cloned()
                .collect();
            if !hits.is_empty() {
                return hits.into_iter().map(|id| (id, Confidence::RECEIVER_TYPED)).collect();
            }
        }
    }

    // Rule 3: unique symbol globally by name.
    if let Some(candidates) = index.by_name.get(&call.callee_name) {
        if candidates.len() == 1 {
            return vec![(candidates[0].clone(), Confidence::UNIQUE_GLOBAL)];
        }
        if candidates.len() > 1 {
            return candidates.iter().take(MAX_AMBIGUOUS_EDGES).cloned().map(|id| (id, Confidence::AMBIGUOUS)).collect();
        }
    }

    // Rule 4: fuzzy match, edit distance <= 2, unique.
    let mut fuzzy: Vec<&NodeId> = Vec::new();
    for (name, ids) in &index.by_name {
        if levenshtein(name, &call.callee_name) <= FUZZY_MAX_DISTANCE {
            fuzzy.extend(ids.iter());
        }
    }
    if fuzzy.len() == 1 {
        return vec![(fuzzy[0].clone(), Confidence::FUZZY)];
    }

    let _ = caller_id;
    Vec::new()
}

/// Hand-rolled edit distance; no corpus crate provides this for the pack's
/// dependency set.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j - 1]).min(row[j])
            };
            prev_diag = cur;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_distance_basic() {
        assert_eq!(levenshtein("validate_user", "validte_user"), 1);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("abc", "xyz"), 3);
    }
}
