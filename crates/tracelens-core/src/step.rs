//! Trace step types as received from the execution collaborator

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable-name → value snapshot at one execution step
pub type Snapshot = BTreeMap<String, Value>;

/// Interpreter event that produced a trace step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Line,
    Call,
    Return,
    Exception,
    Final,
}

/// One unprocessed execution observation
///
/// Missing fields default the way the tracer emits them: event `line`,
/// scope `main`, depth 0, empty snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    /// Collaborator-assigned sequence index; superseded by re-indexing
    #[serde(default)]
    pub step: usize,
    /// 1-indexed source line
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub event: EventKind,
    #[serde(default = "default_scope")]
    pub function: String,
    #[serde(default)]
    pub call_stack_depth: usize,
    #[serde(default)]
    pub variables: Snapshot,
}

fn default_scope() -> String {
    "main".to_string()
}

impl RawStep {
    /// A plain line event at `line` with the given snapshot
    pub fn at_line(line: usize, variables: Snapshot) -> Self {
        Self {
            step: 0,
            line,
            event: EventKind::Line,
            function: default_scope(),
            call_stack_depth: 0,
            variables,
        }
    }
}

/// A cleaned, re-indexed, source-annotated step
///
/// Indices are dense and 1-based after redundant-frame filtering. Never
/// mutated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedStep {
    pub step: usize,
    pub line: usize,
    pub source: String,
    pub function: String,
    pub event: EventKind,
    pub call_stack_depth: usize,
    pub variables: Snapshot,
}

/// Full payload from the execution collaborator: the raw trace plus
/// pass-through program output and exception text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, alias = "exception", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub trace: Vec<RawStep>,
}
