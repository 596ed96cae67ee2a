//! Pipeline timing collection, scaled down from the teacher's
//! `StageTracker`/`PipelineReport` (`examples/bartolli-codanna/src/indexing/pipeline/metrics.rs`)
//! to the fields spec.md §6's `meta.json` actually names: per-phase wall
//! time and per-kind node/edge counts, no throughput or memory tracking.

use crate::graph::{EdgeKind, KnowledgeGraph, NodeKind};
use crate::storage::MetaJson;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    phase_timings_ms: HashMap<String, f64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, phase: &'static str, elapsed: Duration) {
        self.phase_timings_ms.insert(phase.to_string(), elapsed.as_secs_f64() * 1000.0);
    }

    pub fn phase_timings_ms(&self) -> &HashMap<String, f64> {
        &self.phase_timings_ms
    }

    pub fn total_ms(&self) -> f64 {
        self.phase_timings_ms.values().sum()
    }

    /// Build the `meta.json` payload (spec.md §6) from this run's timings
    /// plus the finished graph's node/edge counts by kind.
    pub fn into_meta(self, schema_version: u32, commit_hash: Option<String>, graph: &KnowledgeGraph) -> MetaJson {
        let mut node_counts = HashMap::new();
        for kind in [
            NodeKind::Folder,
            NodeKind::File,
            NodeKind::Function,
            NodeKind::Class,
            NodeKind::Method,
            NodeKind::Interface,
            NodeKind::TypeAlias,
            NodeKind::Enum,
            NodeKind::Community,
            NodeKind::Process,
        ] {
            node_counts.insert(kind.tag().to_string(), graph.nodes_of_kind(kind).count());
        }

        let mut edge_counts = HashMap::new();
        for kind in [
            EdgeKind::Contains,
            EdgeKind::Defines,
            EdgeKind::Calls,
            EdgeKind::Imports,
            EdgeKind::Extends,
            EdgeKind::Implements,
            EdgeKind::UsesType,
            EdgeKind::Exports,
            EdgeKind::MemberOf,
            EdgeKind::StepInProcess,
            EdgeKind::CoupledWith,
        ] {
            let count = graph.edges().iter().filter(|e| e.kind == kind).count();
            edge_counts.insert(kind.tag().to_string(), count);
        }

        MetaJson { schema_version, commit_hash, phase_timings_ms: self.phase_timings_ms, node_counts, edge_counts }
    }
}

/// Times a phase closure and records it under `name`.
pub fn timed<T>(metrics: &mut PipelineMetrics, name: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    metrics.record(name, start.elapsed());
    result
}
