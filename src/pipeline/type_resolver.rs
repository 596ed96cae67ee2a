//! Type resolver (spec.md §4.7): USES_TYPE edges from each symbol's
//! syntactic param/return/variable type annotations to the Class, Interface,
//! TypeAlias, or Enum they name. Same candidate pool as the call tracer, but
//! no fuzzy fallback and no confidence score — an unresolved or ambiguous
//! annotation is just dropped.

use crate::graph::{Edge, EdgeKind, EdgeProps, KnowledgeGraph, NodeId, NodeKind};
use crate::types::TypeRole;
use std::collections::HashMap;

const TYPE_KINDS: &[NodeKind] = &[NodeKind::Class, NodeKind::Interface, NodeKind::TypeAlias, NodeKind::Enum];

pub fn resolve_types(graph: &mut KnowledgeGraph) {
    let mut by_name: HashMap<String, Vec<NodeId>> = HashMap::new();
    for node in graph.symbols() {
        if TYPE_KINDS.contains(&node.kind) {
            if let Some(symbol) = node.as_symbol() {
                by_name.entry(symbol.name.clone()).or_default().push(node.id.clone());
            }
        }
    }

    let mut new_edges = Vec::new();
    for node in graph.symbols() {
        let Some(symbol) = node.as_symbol() else { continue };

        let mut refs: Vec<(String, TypeRole)> = symbol.param_types.iter().map(|t| (t.clone(), TypeRole::Param)).collect();
        if let Some(ret) = &symbol.return_type {
            refs.push((ret.clone(), TypeRole::Return));
        }
        refs.extend(symbol.variable_types.iter().map(|t| (t.clone(), TypeRole::Variable)));

        for (annotation, role) in refs {
            let simple = simple_type_name(&annotation);
            let Some(candidates) = by_name.get(simple) else { continue };
            if candidates.len() != 1 {
                continue;
            }
            let target = candidates[0].clone();
            if target == node.id {
                continue;
            }
            new_edges.push(Edge::new(node.id.clone(), target, EdgeKind::UsesType, EdgeProps::UsesType { role }));
        }
    }

    for edge in new_edges {
        graph.add_edge(edge);
    }
}

/// Strips generic/array/nullable/namespace decoration down to a bare type
/// name: `List<User>` -> `User`, `User[]` -> `User`, `User?` -> `User`,
/// `ns.User` -> `User`.
fn simple_type_name(annotation: &str) -> &str {
    let trimmed = annotation.trim().trim_end_matches('?').trim_end_matches("[]");
    let inner = match (trimmed.find('<'), trimmed.rfind('>')) {
        (Some(open), Some(close)) if close > open => &trimmed[open + 1..close],
        _ => trimmed,
    };
    inner.rsplit('.').next().unwrap_or(inner).trim()
}
