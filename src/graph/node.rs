//! Node shapes for the knowledge graph (spec.md §3 "Nodes").

use crate::types::{Language, Range};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable cross-phase handle into the graph.
///
/// For path-addressed nodes (Folder, File, and every Symbol kind) this is
/// `{kind}:{relative_path}:{qualified_name}`, e.g.
/// `method:src/models/user.py:User.save`. Community and Process nodes get a
/// fresh UUID instead, since they have no natural path identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn folder(path: &str) -> Self {
        Self::new(format!("folder:{path}"))
    }

    pub fn file(path: &str) -> Self {
        Self::new(format!("file:{path}"))
    }

    /// Build a symbol id from its kind, defining file path, and qualified
    /// name (e.g. `Class.method` for methods).
    pub fn symbol(kind: NodeKind, path: &str, qualified_name: &str) -> Self {
        Self::new(format!("{}:{path}:{qualified_name}", kind.tag()))
    }

    pub fn fresh(kind: NodeKind) -> Self {
        Self::new(format!("{}:{}", kind.tag(), uuid::Uuid::new_v4()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Folder,
    File,
    Function,
    Class,
    Method,
    Interface,
    TypeAlias,
    Enum,
    Community,
    Process,
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::Method => "method",
            NodeKind::Interface => "interface",
            NodeKind::TypeAlias => "type_alias",
            NodeKind::Enum => "enum",
            NodeKind::Community => "community",
            NodeKind::Process => "process",
        }
    }

    /// Whether this kind participates as a "Symbol" for the purposes of
    /// spec.md §3's DEFINES/community/call-graph invariants.
    pub fn is_symbol(&self) -> bool {
        matches!(
            self,
            NodeKind::Function
                | NodeKind::Class
                | NodeKind::Method
                | NodeKind::Interface
                | NodeKind::TypeAlias
                | NodeKind::Enum
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderPayload {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub path: String,
    pub language: Option<Language>,
    pub byte_size: u64,
    pub hash: String,
    pub parse_failed: bool,
}

/// Kind-specific fields, dispatched on the outer [`NodeKind`] (spec.md §9
/// design note: "a single Symbol shape with a kind discriminator").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SymbolDetail {
    Function,
    Class {
        bases_syntactic: Vec<String>,
    },
    Method {
        /// Owning Class or Interface node id. For `is_stub` methods this
        /// points at the Interface that declares the stub.
        owner_id: NodeId,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolPayload {
    pub name: String,
    pub file: NodeId,
    pub range: Range,
    pub signature: Option<String>,
    pub body_snippet: Option<String>,
    pub decorators: Vec<String>,
    pub is_exported: bool,
    /// Set only for a TS/JS `export default` function (spec.md §4.9).
    pub is_default_export: bool,
    pub is_test: bool,
    pub is_dead: bool,
    pub embedding: Option<Vec<f32>>,
    /// Syntactic (unresolved) parameter/return/local-variable type
    /// annotations, consumed by the type resolver. Empty for non-callable
    /// symbols (Class, Interface, TypeAlias, Enum).
    pub param_types: Vec<String>,
    pub return_type: Option<String>,
    pub variable_types: Vec<String>,
    pub detail: SymbolDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPayload {
    pub label: String,
    pub cohesion: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    IntraCommunity,
    CrossCommunity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPayload {
    pub name: String,
    pub entry_symbol_id: NodeId,
    pub kind: ProcessKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodePayload {
    Folder(FolderPayload),
    File(FilePayload),
    Symbol(SymbolPayload),
    Community(CommunityPayload),
    Process(ProcessPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub payload: NodePayload,
}

impl Node {
    pub fn as_symbol(&self) -> Option<&SymbolPayload> {
        match &self.payload {
            NodePayload::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol_mut(&mut self) -> Option<&mut SymbolPayload> {
        match &mut self.payload {
            NodePayload::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FilePayload> {
        match &self.payload {
            NodePayload::File(f) => Some(f),
            _ => None,
        }
    }
}
