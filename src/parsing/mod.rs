//! Per-language parsers (spec.md §4.3).
//!
//! Each parser consumes one file's source text, walks its tree-sitter
//! syntax tree, and emits raw facts with no cross-file resolution: symbol
//! definitions, call sites, imports, heritage, and type references. ID
//! assignment and all resolution happen later in the pipeline, mirroring
//! the teacher's parse/collect split
//! (`examples/bartolli-codanna/src/indexing/pipeline/types.rs`: "Parse stage
//! produces raw types without IDs").

pub mod csharp;
pub mod javascript;
pub mod python;
pub mod typescript;

use crate::error::ParseError;
use crate::types::{Language, Range};

/// A class/interface/alias/enum/method/function definition, before a
/// [`crate::graph::NodeId`] is assigned.
#[derive(Debug, Clone)]
pub struct RawSymbol {
    pub name: String,
    pub kind: RawSymbolKind,
    pub range: Range,
    pub signature: Option<String>,
    pub body_snippet: Option<String>,
    pub decorators: Vec<String>,
    pub is_exported: bool,
    /// Set only for a TS/JS `export default` function — a stronger signal
    /// than `is_exported` for entry-point detection (§4.9).
    pub is_default_export: bool,
    pub is_test: bool,
    pub param_types: Vec<String>,
    pub return_type: Option<String>,
    pub variable_types: Vec<String>,
}

impl RawSymbol {
    pub fn new(name: impl Into<String>, kind: RawSymbolKind, range: Range) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            signature: None,
            body_snippet: None,
            decorators: Vec::new(),
            is_exported: false,
            is_default_export: false,
            is_test: false,
            param_types: Vec::new(),
            return_type: None,
            variable_types: Vec::new(),
        }
    }

    /// The name used to build this symbol's node id and to key CALLS edges
    /// pointing at it. For constructors this is always `{owner}.ctor`
    /// regardless of what the source language spells the constructor as
    /// (`__init__`, `constructor`, or the class name itself) — the
    /// distinguishing suffix spec.md §9 mandates uniformly, not just for C#.
    pub fn qualified_name(&self) -> String {
        match &self.kind {
            RawSymbolKind::Method { owner_name, is_ctor: true, .. } => format!("{owner_name}.ctor"),
            RawSymbolKind::Method { owner_name, .. } => format!("{owner_name}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RawSymbolKind {
    Function,
    Class {
        bases_syntactic: Vec<String>,
    },
    Method {
        /// Name of the owning Class or Interface, resolved to a NodeId at
        /// collect time.
        owner_name: String,
        is_override: bool,
        is_property: bool,
        is_ctor: bool,
        is_stub: bool,
    },
    Interface {
        methods_declared: Vec<String>,
    },
    TypeAlias {
        target_syntactic: String,
    },
    Enum {
        variants: Vec<String>,
    },
}

/// A call expression, before the callee name is bound to a symbol id
/// (spec.md §4.3: "caller symbol id, callee textual name, optional receiver
/// expression, optional receiver static type ... and source span").
#[derive(Debug, Clone)]
pub struct RawCallSite {
    /// Qualified name of the enclosing symbol within this file
    /// (`Class.method` for methods, plain name for functions).
    pub caller_qualified_name: String,
    pub callee_name: String,
    pub receiver_expr: Option<String>,
    pub receiver_static_type: Option<String>,
    pub range: Range,
}

/// A raw import statement, before its specifier is resolved to a file id.
#[derive(Debug, Clone)]
pub struct RawImport {
    pub specifier: String,
    pub symbols: Vec<String>,
    pub range: Range,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub symbols: Vec<RawSymbol>,
    pub calls: Vec<RawCallSite>,
    pub imports: Vec<RawImport>,
}

pub trait LanguageParser {
    fn parse(&mut self, source: &str) -> Result<ParseOutput, ParseError>;
}

/// Construct the parser for `language`. One instance per file; tree-sitter
/// parsers are cheap to build and are not `Send`-shared across threads, so
/// each rayon worker builds its own (spec.md §5: "a read-only parser cache
/// keyed by language" is satisfied by the per-thread grammar `Language`
/// statics tree-sitter itself caches; this factory just wires them up).
pub fn parser_for(language: Language) -> Box<dyn LanguageParser> {
    match language {
        Language::Python => Box::new(python::PythonParser::new()),
        Language::TypeScript => Box::new(typescript::TypeScriptParser::new()),
        Language::JavaScript => Box::new(javascript::JavaScriptParser::new()),
        Language::CSharp => Box::new(csharp::CSharpParser::new()),
    }
}

/// Shared helper: read a tree-sitter node's source text.
pub(crate) fn node_text<'a>(node: tree_sitter::Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub(crate) fn node_range(node: tree_sitter::Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(start.row as u32 + 1, start.column as u16, end.row as u32 + 1, end.column as u16)
}
