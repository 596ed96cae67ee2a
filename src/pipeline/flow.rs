//! Process (flow) detector (spec.md §4.9): framework-aware entry-point
//! detection, then a bounded BFS over CALLS from each entry recorded as a
//! Process with one STEP_IN_PROCESS per visited symbol.

use crate::graph::{Edge, EdgeKind, EdgeProps, KnowledgeGraph, Node, NodeId, NodeKind, NodePayload, ProcessKind, ProcessPayload, SymbolDetail};
use crate::types::Language;

pub fn detect_processes(graph: &mut KnowledgeGraph, max_depth: usize) {
    let entries: Vec<NodeId> = graph.symbols().filter(|n| is_entry_point(graph, n)).map(|n| n.id.clone()).collect();

    let mut new_nodes = Vec::new();
    let mut new_edges = Vec::new();

    for entry in entries {
        let steps = graph.bfs_calls(&entry, max_depth);
        let communities = step_communities(graph, &steps);
        let kind = if communities.len() <= 1 { ProcessKind::IntraCommunity } else { ProcessKind::CrossCommunity };
        let name = graph.node(&entry).and_then(|n| n.as_symbol()).map(|s| s.name.clone()).unwrap_or_default();

        let process_id = NodeId::fresh(NodeKind::Process);
        new_nodes.push(Node {
            id: process_id.clone(),
            kind: NodeKind::Process,
            payload: NodePayload::Process(ProcessPayload { name, entry_symbol_id: entry.clone(), kind }),
        });

        for (symbol_id, step_number) in steps {
            new_edges.push(Edge::new(
                symbol_id,
                process_id.clone(),
                EdgeKind::StepInProcess,
                EdgeProps::StepInProcess { step_number: step_number as u32 },
            ));
        }
    }

    for node in new_nodes {
        graph.upsert_node(node);
    }
    for edge in new_edges {
        graph.add_edge(edge);
    }
}

fn step_communities(graph: &KnowledgeGraph, steps: &[(NodeId, usize)]) -> std::collections::HashSet<NodeId> {
    steps
        .iter()
        .filter_map(|(id, _)| graph.edges_from(id, EdgeKind::MemberOf).next())
        .map(|e| e.target.clone())
        .collect()
}

fn is_entry_point(graph: &KnowledgeGraph, node: &Node) -> bool {
    let Some(symbol) = node.as_symbol() else { return false };
    let Some(file) = graph.node(&symbol.file).and_then(|f| f.as_file()) else { return false };
    let language = file.language;

    if symbol.name == "__main__" {
        return true;
    }

    match language {
        Some(Language::Python) => {
            symbol.decorators.iter().any(|d| {
                d.starts_with("app.route")
                    || d.starts_with("router.get")
                    || d.starts_with("router.post")
                    || d.starts_with("router.put")
                    || d.starts_with("router.delete")
                    || d.starts_with("click.command")
            }) || symbol.name.starts_with("test_")
        }
        Some(Language::TypeScript) | Some(Language::JavaScript) => {
            symbol.is_default_export
                || (symbol.is_exported
                    && (symbol.name == "handler"
                        || symbol.name == "middleware"
                        || is_express_handler_signature(&symbol.signature)))
        }
        Some(Language::CSharp) => {
            symbol.name == "Main"
                || symbol.decorators.iter().any(|d| {
                    let d = d.trim_start_matches('[').trim_end_matches(']');
                    matches!(d, "HttpGet" | "HttpPost" | "Route" | "ApiController" | "Fact" | "Test" | "TestMethod")
                        || d.starts_with("HttpGet(")
                        || d.starts_with("HttpPost(")
                        || d.starts_with("Route(")
                })
        }
        None => false,
    }
}

fn is_express_handler_signature(signature: &Option<String>) -> bool {
    let Some(sig) = signature else { return false };
    let sig = sig.trim_start_matches('(').trim_end_matches(')');
    let params: Vec<&str> = sig.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    matches!(params.as_slice(), ["req", "res"] | ["req", "res", "next"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FilePayload, SymbolPayload};
    use crate::types::Range;

    fn make_function(rel_path: &str, name: &str, decorators: Vec<&str>, is_exported: bool, signature: Option<&str>) -> Node {
        make_function_ex(rel_path, name, decorators, is_exported, false, signature)
    }

    fn make_function_ex(rel_path: &str, name: &str, decorators: Vec<&str>, is_exported: bool, is_default_export: bool, signature: Option<&str>) -> Node {
        Node {
            id: NodeId::symbol(NodeKind::Function, rel_path, name),
            kind: NodeKind::Function,
            payload: NodePayload::Symbol(SymbolPayload {
                name: name.into(),
                file: NodeId::file(rel_path),
                range: Range::new(1, 0, 1, 1),
                signature: signature.map(String::from),
                body_snippet: None,
                decorators: decorators.into_iter().map(String::from).collect(),
                is_exported,
                is_default_export,
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

    fn file_node(rel_path: &str, language: Language) -> Node {
        Node {
            id: NodeId::file(rel_path),
            kind: NodeKind::File,
            payload: NodePayload::File(FilePayload { path: rel_path.into(), language: Some(language), byte_size: 0, hash: String::new(), parse_failed: false }),
        }
    }

    #[test]
    fn python_route_decorator_is_entry_point() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(file_node("app.py", Language::Python));
        graph.upsert_node(make_function("app.py", "handler", vec!["app.route(\"/x\")"], true, None));

        detect_processes(&mut graph, 6);

        let processes: Vec<_> = graph.nodes_of_kind(NodeKind::Process).collect();
        assert_eq!(processes.len(), 1);
    }

    #[test]
    fn plain_function_is_not_an_entry_point() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(file_node("app.py", Language::Python));
        graph.upsert_node(make_function("app.py", "helper", vec![], false, None));

        detect_processes(&mut graph, 6);
        assert_eq!(graph.nodes_of_kind(NodeKind::Process).count(), 0);
    }

    #[test]
    fn default_exported_function_is_an_entry_point() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(file_node("handler.ts", Language::TypeScript));
        graph.upsert_node(make_function_ex("handler.ts", "doThing", vec![], true, true, None));

        detect_processes(&mut graph, 6);
        assert_eq!(graph.nodes_of_kind(NodeKind::Process).count(), 1);
    }

    #[test]
    fn non_default_export_without_a_recognized_name_is_not_an_entry_point() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(file_node("util.ts", Language::TypeScript));
        graph.upsert_node(make_function("util.ts", "doThing", vec![], true, None));

        detect_processes(&mut graph, 6);
        assert_eq!(graph.nodes_of_kind(NodeKind::Process).count(), 0);
    }

    #[test]
    fn step_in_process_edge_runs_from_symbol_to_process() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(file_node("app.py", Language::Python));
        graph.upsert_node(make_function("app.py", "handler", vec!["app.route(\"/x\")"], true, None));

        detect_processes(&mut graph, 6);

        let handler_id = NodeId::symbol(NodeKind::Function, "app.py", "handler");
        let process_id = graph.nodes_of_kind(NodeKind::Process).next().unwrap().id.clone();
        assert!(graph.has_edge(&handler_id, &process_id, EdgeKind::StepInProcess));
        assert!(!graph.has_edge(&process_id, &handler_id, EdgeKind::StepInProcess));
    }
}
