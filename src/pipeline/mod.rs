//! The ingestion pipeline (spec.md §4): twelve phases run in a fixed order
//! over one shared [`KnowledgeGraph`], mirroring the teacher's
//! DISCOVER → READ → PARSE → COLLECT → INDEX shape
//! (`examples/bartolli-codanna/src/indexing/pipeline/mod.rs`), extended with
//! the resolution/analysis phases this spec adds after collection.

pub mod blocklist;
pub mod call_tracer;
pub mod collect;
pub mod community;
pub mod coupling;
pub mod dead_code;
pub mod embedding;
pub mod flow;
pub mod heritage;
pub mod import_resolver;
pub mod metrics;
pub mod structure;
pub mod type_resolver;
pub mod walker;

pub use metrics::PipelineMetrics;

use crate::config::Settings;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::KnowledgeGraph;
use crate::parsing::{parser_for, ParseOutput};
use collect::CollectedFile;
use embedding::{Encoder, NullEncoder};
use metrics::timed;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External cancellation signal, checked between phases and between
/// per-file work items within a parallel phase (spec.md §5). A cancelled
/// run discards its in-memory graph rather than persisting partial state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A finished run: the populated graph plus the timings/counts that become
/// `.axon/meta.json`.
pub struct PipelineOutcome {
    pub graph: KnowledgeGraph,
    pub metrics: PipelineMetrics,
}

/// Orchestrates the twelve phases over one repository root.
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run every phase in order, checking `cancellation` between each one.
    /// Uses the no-op [`NullEncoder`] for §4.12; call [`Pipeline::run_with_encoder`]
    /// to supply a real one.
    pub fn run(&self, root: &Path, cancellation: &CancellationToken) -> PipelineResult<PipelineOutcome> {
        self.run_with_encoder(root, cancellation, &NullEncoder)
    }

    pub fn run_with_encoder(&self, root: &Path, cancellation: &CancellationToken, encoder: &dyn Encoder) -> PipelineResult<PipelineOutcome> {
        let mut graph = KnowledgeGraph::new();
        let mut metrics = PipelineMetrics::new();

        macro_rules! checkpoint {
            ($phase:expr) => {
                if cancellation.is_cancelled() {
                    return Err(PipelineError::Cancelled { phase: $phase });
                }
            };
        }

        checkpoint!("walk");
        let files = timed(&mut metrics, "walk", || walker::FileWalker::new(&self.settings).walk(root));

        checkpoint!("structure");
        timed(&mut metrics, "structure", || structure::build_structure(&mut graph, root, &files));

        checkpoint!("parse");
        let parsed = timed(&mut metrics, "parse", || parse_files(root, &files, cancellation));
        checkpoint!("collect");
        let collected = timed(&mut metrics, "collect", || collect_parsed(&mut graph, parsed));

        checkpoint!("import_resolver");
        timed(&mut metrics, "import_resolver", || import_resolver::resolve_imports(&mut graph, &self.settings, &collected));

        checkpoint!("call_tracer");
        timed(&mut metrics, "call_tracer", || call_tracer::trace_calls(&mut graph, &collected));

        checkpoint!("heritage");
        timed(&mut metrics, "heritage", || heritage::resolve_heritage(&mut graph));

        checkpoint!("type_resolver");
        timed(&mut metrics, "type_resolver", || type_resolver::resolve_types(&mut graph));

        checkpoint!("community");
        timed(&mut metrics, "community", || community::detect_communities(&mut graph));

        checkpoint!("flow");
        timed(&mut metrics, "flow", || flow::detect_processes(&mut graph, self.settings.indexing.flow_max_depth));

        checkpoint!("dead_code");
        timed(&mut metrics, "dead_code", || dead_code::flag_dead_code(&mut graph));

        checkpoint!("coupling");
        timed(&mut metrics, "coupling", || coupling::detect_coupling(&mut graph, root, &self.settings.coupling));

        checkpoint!("embedding");
        if self.settings.embedding.enabled {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|source| PipelineError::Io { path: root.to_path_buf(), source })?;
            timed(&mut metrics, "embedding", || rt.block_on(embedding::generate_embeddings(&mut graph, &self.settings.embedding, encoder)));
        }

        Ok(PipelineOutcome { graph, metrics })
    }
}

struct ParsedFile {
    rel_path: String,
    language_known: bool,
    output: Result<ParseOutput, crate::error::ParseError>,
}

fn parse_files(root: &Path, files: &[walker::WalkedFile], cancellation: &CancellationToken) -> Vec<ParsedFile> {
    files
        .par_iter()
        .filter(|f| f.language.is_some())
        .filter_map(|f| {
            if cancellation.is_cancelled() {
                return None;
            }
            let language = f.language.expect("filtered to Some above");
            let rel_path = structure::relative_path(root, &f.path);
            let output = match std::fs::read_to_string(&f.path) {
                Ok(source) => parser_for(language).parse(&source),
                Err(_) => Err(crate::error::ParseError::InvalidUtf8),
            };
            Some(ParsedFile { rel_path, language_known: true, output })
        })
        .collect()
}

fn collect_parsed(graph: &mut KnowledgeGraph, parsed: Vec<ParsedFile>) -> Vec<CollectedFile> {
    let mut collected = Vec::with_capacity(parsed.len());
    for file in parsed {
        debug_assert!(file.language_known);
        match file.output {
            Ok(output) => collected.push(collect::collect(graph, &file.rel_path, output)),
            Err(err) => {
                tracing::warn!(path = %file.rel_path, error = %err, "parse failed; file kept with no symbols");
                if let Some(node) = graph.node_mut(&crate::graph::NodeId::file(&file.rel_path)) {
                    if let Some(payload) = match &mut node.payload {
                        crate::graph::NodePayload::File(f) => Some(f),
                        _ => None,
                    } {
                        payload.parse_failed = true;
                    }
                }
            }
        }
    }
    collected
}
