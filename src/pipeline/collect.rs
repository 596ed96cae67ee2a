//! Turns one file's [`ParseOutput`] into graph nodes (spec.md §4.3 output →
//! §3 data model), assigning the node ids every later phase keys off of.
//! Grounded on the teacher's parse/collect split
//! (`examples/bartolli-codanna/src/indexing/pipeline/types.rs`): parsers
//! never see a `NodeId`, collect is the only place one is minted.

use crate::graph::{Edge, EdgeKind, KnowledgeGraph, Node, NodeId, NodeKind, NodePayload, SymbolDetail, SymbolPayload};
use crate::parsing::{ParseOutput, RawCallSite, RawImport, RawSymbolKind};
use std::collections::HashMap;

/// Everything a later phase needs about one parsed file, beyond what's
/// already in the graph: its raw (unresolved) calls/imports, and a map from
/// in-file qualified name to the node id collect assigned it.
pub struct CollectedFile {
    pub file_id: NodeId,
    pub rel_path: String,
    pub calls: Vec<RawCallSite>,
    pub imports: Vec<RawImport>,
    pub local_symbols: HashMap<String, NodeId>,
}

pub fn collect(graph: &mut KnowledgeGraph, rel_path: &str, output: ParseOutput) -> CollectedFile {
    let file_id = NodeId::file(rel_path);
    let mut local_symbols = HashMap::new();

    // Methods only carry their owner's bare name; a method's owner can be
    // either a Class or an Interface, so its real NodeKind has to come from
    // the owning type's own symbol, not be assumed.
    let owner_kinds: HashMap<&str, NodeKind> = output
        .symbols
        .iter()
        .filter_map(|s| match &s.kind {
            RawSymbolKind::Class { .. } => Some((s.name.as_str(), NodeKind::Class)),
            RawSymbolKind::Interface { .. } => Some((s.name.as_str(), NodeKind::Interface)),
            _ => None,
        })
        .collect();

    for raw in &output.symbols {
        let qualified_name = raw.qualified_name();
        let kind = node_kind_of(&raw.kind);
        let id = NodeId::symbol(kind, rel_path, &qualified_name);

        let detail = match &raw.kind {
            RawSymbolKind::Function => SymbolDetail::Function,
            RawSymbolKind::Class { bases_syntactic } => SymbolDetail::Class { bases_syntactic: bases_syntactic.clone() },
            RawSymbolKind::Method { owner_name, is_override, is_property, is_ctor, is_stub } => SymbolDetail::Method {
                owner_id: NodeId::symbol(owner_kinds.get(owner_name.as_str()).copied().unwrap_or(NodeKind::Class), rel_path, owner_name),
                is_override: *is_override,
                is_property: *is_property,
                is_ctor: *is_ctor,
                is_stub: *is_stub,
            },
            RawSymbolKind::Interface { methods_declared } => SymbolDetail::Interface { methods_declared: methods_declared.clone() },
            RawSymbolKind::TypeAlias { target_syntactic } => SymbolDetail::TypeAlias { target_syntactic: target_syntactic.clone() },
            RawSymbolKind::Enum { variants } => SymbolDetail::Enum { variants: variants.clone() },
        };

        let payload = SymbolPayload {
            name: raw.name.clone(),
            file: file_id.clone(),
            range: raw.range,
            signature: raw.signature.clone(),
            body_snippet: raw.body_snippet.clone(),
            decorators: raw.decorators.clone(),
            is_exported: raw.is_exported,
            is_default_export: raw.is_default_export,
            is_test: raw.is_test,
            is_dead: false,
            embedding: None,
            param_types: raw.param_types.clone(),
            return_type: raw.return_type.clone(),
            variable_types: raw.variable_types.clone(),
            detail,
        };

        graph.upsert_node(Node { id: id.clone(), kind, payload: NodePayload::Symbol(payload) });
        graph.add_edge(Edge::plain(file_id.clone(), id.clone(), EdgeKind::Defines));
        if raw.is_exported {
            graph.add_edge(Edge::plain(file_id.clone(), id.clone(), EdgeKind::Exports));
        }
        local_symbols.insert(qualified_name, id);
    }

    CollectedFile { file_id, rel_path: rel_path.to_string(), calls: output.calls, imports: output.imports, local_symbols }
}

fn node_kind_of(kind: &RawSymbolKind) -> NodeKind {
    match kind {
        RawSymbolKind::Function => NodeKind::Function,
        RawSymbolKind::Class { .. } => NodeKind::Class,
        RawSymbolKind::Method { .. } => NodeKind::Method,
        RawSymbolKind::Interface { .. } => NodeKind::Interface,
        RawSymbolKind::TypeAlias { .. } => NodeKind::TypeAlias,
        RawSymbolKind::Enum { .. } => NodeKind::Enum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::RawSymbol;
    use crate::types::Range;

    #[test]
    fn collect_assigns_ids_and_defines_edge() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(Node {
            id: NodeId::file("a.py"),
            kind: NodeKind::File,
            payload: NodePayload::File(crate::graph::FilePayload {
                path: "a.py".into(),
                language: None,
                byte_size: 0,
                hash: String::new(),
                parse_failed: false,
            }),
        });

        let mut output = ParseOutput::default();
        output.symbols.push(RawSymbol::new("f", RawSymbolKind::Function, Range::new(1, 0, 1, 10)));
        let collected = collect(&mut graph, "a.py", output);

        let id = NodeId::symbol(NodeKind::Function, "a.py", "f");
        assert!(graph.node(&id).is_some());
        assert!(graph.has_edge(&NodeId::file("a.py"), &id, EdgeKind::Defines));
        assert_eq!(collected.local_symbols.get("f"), Some(&id));
    }
}
