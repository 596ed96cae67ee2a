//! Import resolver (spec.md §4.4): resolves each raw import specifier to a
//! target File id, writing IMPORTS edges with the imported symbol names.

use crate::config::Settings;
use crate::graph::{Edge, EdgeKind, EdgeProps, KnowledgeGraph, NodeId};
use crate::pipeline::collect::CollectedFile;
use std::collections::HashSet;

const FIXED_EXTENSIONS: &[&str] = &[".py", ".pyi", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".cs"];
const INDEX_NAMES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx", "index.mjs", "index.cjs"];
const INIT_NAMES: &[&str] = &["__init__.py", "__init__.pyi"];

pub fn resolve_imports(graph: &mut KnowledgeGraph, settings: &Settings, files: &[CollectedFile]) {
    let known: HashSet<String> = files.iter().map(|f| f.rel_path.clone()).collect();

    for file in files {
        let importing_dir = parent_dir(&file.rel_path);
        for import in &file.imports {
            let Some(target) = resolve_specifier(&importing_dir, &import.specifier, &known, &settings.indexing.source_roots) else {
                continue;
            };
            graph.add_edge(Edge::new(
                file.file_id.clone(),
                NodeId::file(&target),
                EdgeKind::Imports,
                EdgeProps::Imports { symbols: import.symbols.clone() },
            ));
        }
    }
}

fn parent_dir(rel_path: &str) -> String {
    match rel_path.rfind('/') {
        Some(idx) => rel_path[..idx].to_string(),
        None => String::new(),
    }
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    ExplicitExtension,
    AddedExtension,
    DirectoryIndex,
}

fn resolve_specifier(importing_dir: &str, specifier: &str, known: &HashSet<String>, source_roots: &[String]) -> Option<String> {
    if specifier.starts_with("./") || specifier.starts_with("../") {
        let base = if importing_dir.is_empty() { normalize(specifier) } else { normalize(&format!("{importing_dir}/{specifier}")) };
        return resolve_base(&base, known);
    }

    // Package-absolute: joined against declared source roots.
    let dotted_path = specifier.replace('.', "/");
    for root in source_roots {
        let base = normalize(&format!("{root}/{dotted_path}"));
        if let Some(found) = resolve_base(&base, known) {
            return Some(found);
        }
    }

    // Bare specifier with no matching in-repo path: no edge, no error.
    None
}

fn resolve_base(base: &str, known: &HashSet<String>) -> Option<String> {
    let mut candidates: Vec<(Rank, String)> = Vec::new();

    if known.contains(base) {
        candidates.push((Rank::ExplicitExtension, base.to_string()));
    }
    for ext in FIXED_EXTENSIONS {
        let candidate = format!("{base}{ext}");
        if known.contains(&candidate) {
            candidates.push((Rank::AddedExtension, candidate));
        }
    }
    for index_name in INDEX_NAMES.iter().chain(INIT_NAMES) {
        let candidate = if base.is_empty() { (*index_name).to_string() } else { format!("{base}/{index_name}") };
        if known.contains(&candidate) {
            candidates.push((Rank::DirectoryIndex, candidate));
        }
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    candidates.into_iter().next().map(|(_, path)| path)
}
