//! Primitive value types shared across the pipeline and graph model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte-offset-free source span, line/column based like tree-sitter's own
/// `Point`, so parsers can hand ranges straight to the graph without a
/// conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn contains(&self, line: u32, column: u16) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && column < self.start_column {
            return false;
        }
        if line == self.end_line && column > self.end_column {
            return false;
        }
        true
    }
}

/// A source language recognized by the pipeline's parsers.
///
/// Files with an extension that doesn't map to a variant here are still
/// walked and become `File` nodes with `language = unknown` (spec.md §4.1);
/// they are never handed to a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    CSharp,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(Language::Python),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "cs" => Some(Language::CSharp),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::CSharp => "csharp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Call-resolution certainty, spec.md §4.5. Always in `[0.0, 1.0]`; higher
/// means stronger binding evidence. A plain newtype (rather than a bare
/// `f32`) so the `[0,1]` invariant has one place to enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence(f32);

impl Confidence {
    pub const UNIQUE_LOCAL: Confidence = Confidence(1.0);
    pub const RECEIVER_TYPED: Confidence = Confidence(0.8);
    pub const UNIQUE_GLOBAL: Confidence = Confidence(0.6);
    pub const FUZZY: Confidence = Confidence(0.5);
    pub const AMBIGUOUS: Confidence = Confidence(0.4);

    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// `max()` over two confidences for the same (caller, callee) pair
    /// keeps the strongest evidence, per spec.md §4.5.
    pub fn max(self, other: Confidence) -> Confidence {
        Confidence(self.0.max(other.0))
    }
}

impl Eq for Confidence {}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// USES_TYPE.role, spec.md §3 — the closed set a type reference can be
/// written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRole {
    Param,
    Return,
    Variable,
}

impl fmt::Display for TypeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeRole::Param => "param",
            TypeRole::Return => "return",
            TypeRole::Variable => "variable",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_contains_boundaries() {
        let r = Range::new(10, 5, 15, 20);
        assert!(r.contains(10, 5));
        assert!(r.contains(15, 20));
        assert!(!r.contains(9, 10));
        assert!(!r.contains(10, 4));
        assert!(!r.contains(15, 21));
    }

    #[test]
    fn confidence_clamped_and_ordered() {
        assert_eq!(Confidence::new(1.5).value(), 1.0);
        assert_eq!(Confidence::new(-0.5).value(), 0.0);
        assert!(Confidence::UNIQUE_LOCAL > Confidence::AMBIGUOUS);
        assert_eq!(
            Confidence::AMBIGUOUS.max(Confidence::FUZZY),
            Confidence::FUZZY
        );
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("cjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("cs"), Some(Language::CSharp));
        assert_eq!(Language::from_extension("rb"), None);
    }
}
