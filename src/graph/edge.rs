//! Edge shapes for the knowledge graph (spec.md §3 "Edges").

use crate::graph::NodeId;
use crate::types::{Confidence, TypeRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    Defines,
    Calls,
    Imports,
    Extends,
    Implements,
    UsesType,
    Exports,
    MemberOf,
    StepInProcess,
    CoupledWith,
}

impl EdgeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::UsesType => "USES_TYPE",
            EdgeKind::Exports => "EXPORTS",
            EdgeKind::MemberOf => "MEMBER_OF",
            EdgeKind::StepInProcess => "STEP_IN_PROCESS",
            EdgeKind::CoupledWith => "COUPLED_WITH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeProps {
    None,
    Calls { confidence: Confidence },
    Imports { symbols: Vec<String> },
    UsesType { role: TypeRole },
    StepInProcess { step_number: u32 },
    CoupledWith { strength: f32, co_changes: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub props: EdgeProps,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind, props: EdgeProps) -> Self {
        Self {
            source,
            target,
            kind,
            props,
        }
    }

    pub fn plain(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self::new(source, target, kind, EdgeProps::None)
    }

    pub fn confidence(&self) -> Option<Confidence> {
        match self.props {
            EdgeProps::Calls { confidence } => Some(confidence),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<TypeRole> {
        match self.props {
            EdgeProps::UsesType { role } => Some(role),
            _ => None,
        }
    }
}
