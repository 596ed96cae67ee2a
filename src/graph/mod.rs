//! The in-memory knowledge graph that every pipeline phase reads and
//! mutates (spec.md §2, §3).
//!
//! Grounded on the teacher's `storage::graph::DependencyGraph`
//! (`examples/bartolli-codanna/src/storage/graph.rs`): a `petgraph`
//! directed graph for topology plus a side table for the typed records
//! petgraph's edge weights can't hold directly. Generalized here from a
//! single `SymbolId -> SymbolId` relation to the full typed node/edge model
//! spec.md §3 describes, with per-kind merge semantics on `add_edge`.

mod edge;
mod node;

pub use edge::{Edge, EdgeKind, EdgeProps};
pub use node::{
    CommunityPayload, FilePayload, FolderPayload, Node, NodeId, NodeKind, NodePayload,
    ProcessKind, ProcessPayload, SymbolDetail, SymbolPayload,
};

use indexmap::IndexMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Key used to decide whether a new edge merges into an existing record or
/// becomes a new one. The fourth component disambiguates edges that must
/// coexist under the same (source, target, kind) — today only USES_TYPE,
/// keyed additionally by `role`.
type EdgeKey = (NodeId, NodeId, EdgeKind, u8);

#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeKey, usize>,
    topology: StableDiGraph<NodeId, usize>,
    node_index: HashMap<NodeId, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- nodes --------------------------------------------------------

    /// Idempotent by node id: re-running a phase on the same (repo, commit)
    /// overwrites the payload with an identical one rather than erroring
    /// (spec.md §2: "idempotent per (repo, commit)").
    pub fn upsert_node(&mut self, node: Node) {
        self.ensure_topology_index(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.kind.is_symbol())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn ensure_topology_index(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(&id) {
            return idx;
        }
        let idx = self.topology.add_node(id.clone());
        self.node_index.insert(id, idx);
        idx
    }

    // ---- edges ----------------------------------------------------------

    fn edge_key(edge: &Edge) -> EdgeKey {
        let discriminant = match edge.props {
            EdgeProps::UsesType { role } => role as u8 + 1,
            _ => 0,
        };
        if edge.kind == EdgeKind::CoupledWith {
            // Undirected: normalize so (A,B) and (B,A) collide on one key.
            let (a, b) = if edge.source.as_str() <= edge.target.as_str() {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            (a, b, edge.kind, discriminant)
        } else {
            (edge.source.clone(), edge.target.clone(), edge.kind, discriminant)
        }
    }

    /// Insert an edge, applying the per-kind merge rule spec.md §3/§4
    /// requires instead of blindly appending:
    ///
    /// - CALLS: keeps the max confidence for a repeated (source, target).
    /// - IMPORTS: unions the `symbols` lists.
    /// - USES_TYPE: written at most once per (source, target, role).
    /// - COUPLED_WITH: written once per unordered pair.
    /// - everything else: first write wins, later identical writes are no-ops.
    pub fn add_edge(&mut self, edge: Edge) {
        let key = Self::edge_key(&edge);
        if let Some(&idx) = self.edge_index.get(&key) {
            let existing = &mut self.edges[idx];
            match (&mut existing.props, &edge.props) {
                (EdgeProps::Calls { confidence }, EdgeProps::Calls { confidence: new }) => {
                    *confidence = confidence.max(*new);
                }
                (EdgeProps::Imports { symbols }, EdgeProps::Imports { symbols: new }) => {
                    for s in new {
                        if !symbols.contains(s) {
                            symbols.push(s.clone());
                        }
                    }
                }
                _ => {}
            }
            return;
        }

        let idx = self.edges.len();
        let s = self.ensure_topology_index(edge.source.clone());
        let t = self.ensure_topology_index(edge.target.clone());
        self.topology.add_edge(s, t, idx);
        self.edges.push(edge);
        self.edge_index.insert(key, idx);
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, id: &'a NodeId, kind: EdgeKind) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.kind == kind && (&e.source == id || (kind == EdgeKind::CoupledWith && &e.target == id)))
    }

    pub fn edges_to<'a>(&'a self, id: &'a NodeId, kind: EdgeKind) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.kind == kind && (&e.target == id || (kind == EdgeKind::CoupledWith && &e.source == id)))
    }

    pub fn has_edge(&self, source: &NodeId, target: &NodeId, kind: EdgeKind) -> bool {
        self.edges
            .iter()
            .any(|e| e.kind == kind && &e.source == source && &e.target == target)
    }

    /// Direct callers: symbols with a CALLS edge targeting `id`.
    pub fn callers_of(&self, id: &NodeId) -> Vec<&NodeId> {
        self.edges_to(id, EdgeKind::Calls).map(|e| &e.source).collect()
    }

    pub fn callees_of(&self, id: &NodeId) -> Vec<&NodeId> {
        self.edges_from(id, EdgeKind::Calls).map(|e| &e.target).collect()
    }

    /// BFS over CALLS edges from `start`, bounded by `max_depth`, visiting
    /// each reachable symbol at most once (spec.md §4.9). Returns
    /// `(symbol_id, depth)` pairs in visitation order.
    pub fn bfs_calls(&self, start: &NodeId, max_depth: usize) -> Vec<(NodeId, usize)> {
        let Some(&start_idx) = self.node_index.get(start) else {
            return Vec::new();
        };
        let mut visited = std::collections::HashSet::new();
        visited.insert(start_idx);
        let mut frontier = vec![start_idx];
        let mut out = vec![(start.clone(), 0)];
        let mut depth = 0;

        while !frontier.is_empty() && depth < max_depth {
            depth += 1;
            let mut next = Vec::new();
            for node_idx in frontier {
                for edge_ref in self.topology.edges(node_idx) {
                    let edge_idx = *edge_ref.weight();
                    if self.edges[edge_idx].kind != EdgeKind::Calls {
                        continue;
                    }
                    let target = edge_ref.target();
                    if visited.insert(target) {
                        next.push(target);
                        out.push((self.topology[target].clone(), depth));
                    }
                }
            }
            frontier = next;
        }
        out
    }

    /// Undirected adjacency (CALLS ∪ USES_TYPE ∪ EXTENDS ∪ IMPLEMENTS)
    /// restricted to Symbol nodes, for the community detector (spec.md §4.8).
    pub fn symbol_adjacency(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let relevant = [
            EdgeKind::Calls,
            EdgeKind::UsesType,
            EdgeKind::Extends,
            EdgeKind::Implements,
        ];
        for edge in &self.edges {
            if !relevant.contains(&edge.kind) {
                continue;
            }
            let (Some(src), Some(dst)) = (self.node(&edge.source), self.node(&edge.target)) else {
                continue;
            };
            if !src.kind.is_symbol() || !dst.kind.is_symbol() {
                continue;
            }
            adj.entry(edge.source.clone()).or_default().push(edge.target.clone());
            adj.entry(edge.target.clone()).or_default().push(edge.source.clone());
        }
        for id in self.symbols().map(|n| n.id.clone()) {
            adj.entry(id).or_default();
        }
        adj
    }
}
