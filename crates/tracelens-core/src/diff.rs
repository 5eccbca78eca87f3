//! State diff engine: created/modified/removed partition between snapshots

use crate::step::{ProcessedStep, Snapshot};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Kind of a single variable change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// One atomic variable change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableChange {
    pub name: String,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl VariableChange {
    pub fn created(name: impl Into<String>, new_value: Value) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Created,
            old_value: None,
            new_value: Some(new_value),
        }
    }

    pub fn modified(name: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Modified,
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    pub fn removed(name: impl Into<String>, old_value: Value) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Removed,
            old_value: Some(old_value),
            new_value: None,
        }
    }
}

impl fmt::Display for VariableChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::Created => match &self.new_value {
                Some(value) => write!(f, "{} created = {}", self.name, value),
                None => write!(f, "{} created", self.name),
            },
            ChangeKind::Modified => match (&self.old_value, &self.new_value) {
                (Some(old), Some(new)) => write!(f, "{} changed: {} → {}", self.name, old, new),
                _ => write!(f, "{} changed", self.name),
            },
            ChangeKind::Removed => match &self.old_value {
                Some(value) => write!(f, "{} removed (was {})", self.name, value),
                None => write!(f, "{} removed", self.name),
            },
        }
    }
}

/// Complete state difference for one step transition
///
/// The three lists partition the union of variable names from the two
/// snapshots; each list is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub created: Vec<VariableChange>,
    pub modified: Vec<VariableChange>,
    pub removed: Vec<VariableChange>,
}

impl StateDiff {
    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.modified.is_empty() || !self.removed.is_empty()
    }

    /// All changes in created, modified, removed order
    pub fn all_changes(&self) -> impl Iterator<Item = &VariableChange> {
        self.created
            .iter()
            .chain(self.modified.iter())
            .chain(self.removed.iter())
    }
}

impl fmt::Display for StateDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return write!(f, "No changes");
        }
        for (i, change) in self.all_changes().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", change)?;
        }
        Ok(())
    }
}

/// Computes variable state differences between execution steps
#[derive(Debug, Default)]
pub struct StateDiffEngine;

impl StateDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Difference between two snapshots; an absent or empty previous
    /// snapshot classifies every current name as created
    pub fn diff(&self, prev: Option<&Snapshot>, curr: &Snapshot) -> StateDiff {
        let mut diff = StateDiff::default();

        let prev = match prev {
            Some(p) if !p.is_empty() => p,
            _ => {
                for (name, value) in curr {
                    diff.created.push(VariableChange::created(name, value.clone()));
                }
                return diff;
            }
        };

        // BTreeMap iteration keeps each list sorted by name
        for (name, value) in curr {
            match prev.get(name) {
                None => diff.created.push(VariableChange::created(name, value.clone())),
                Some(old) if old != value => {
                    diff.modified
                        .push(VariableChange::modified(name, old.clone(), value.clone()));
                }
                Some(_) => {}
            }
        }

        for (name, value) in prev {
            if !curr.contains_key(name) {
                diff.removed.push(VariableChange::removed(name, value.clone()));
            }
        }

        debug!(
            created = diff.created.len(),
            modified = diff.modified.len(),
            removed = diff.removed.len(),
            "computed diff"
        );
        diff
    }

    /// One diff per step, folding over consecutive snapshot pairs with
    /// no previous state for step 1. Output length always equals input
    /// length.
    pub fn trace_diffs(&self, trace: &[ProcessedStep]) -> Vec<StateDiff> {
        let mut diffs = Vec::with_capacity(trace.len());
        let mut prev_vars: Option<&Snapshot> = None;

        for step in trace {
            diffs.push(self.diff(prev_vars, &step.variables));
            prev_vars = Some(&step.variables);
        }

        info!(count = diffs.len(), "computed state diffs for trace");
        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::RawStep;
    use crate::normalize::TraceNormalizer;

    fn snapshot(entries: &[(&str, f64)]) -> Snapshot {
        entries
            .iter()
            .map(|(name, n)| (name.to_string(), Value::Number(*n)))
            .collect()
    }

    #[test]
    fn test_first_step_all_created() {
        let engine = StateDiffEngine::new();
        let curr = snapshot(&[("a", 5.0)]);

        let diff = engine.diff(None, &curr);
        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.created[0].name, "a");
        assert_eq!(diff.created[0].new_value, Some(Value::Number(5.0)));
        assert!(diff.modified.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_empty_previous_treated_as_start() {
        let engine = StateDiffEngine::new();
        let prev = Snapshot::new();
        let curr = snapshot(&[("a", 5.0)]);

        let diff = engine.diff(Some(&prev), &curr);
        assert_eq!(diff.created.len(), 1);
    }

    #[test]
    fn test_created_only() {
        let engine = StateDiffEngine::new();
        let prev = snapshot(&[("a", 5.0)]);
        let curr = snapshot(&[("a", 5.0), ("b", 3.0)]);

        let diff = engine.diff(Some(&prev), &curr);
        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.created[0].name, "b");
        assert!(diff.modified.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_sum_step_creates_only_sum() {
        let engine = StateDiffEngine::new();
        let prev = snapshot(&[("a", 5.0), ("b", 3.0)]);
        let curr = snapshot(&[("a", 5.0), ("b", 3.0), ("sum_val", 8.0)]);

        let diff = engine.diff(Some(&prev), &curr);
        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.created[0].name, "sum_val");
        assert_eq!(diff.created[0].new_value, Some(Value::Number(8.0)));
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_modified_and_removed() {
        let engine = StateDiffEngine::new();
        let prev = snapshot(&[("a", 1.0), ("gone", 9.0)]);
        let curr = snapshot(&[("a", 2.0)]);

        let diff = engine.diff(Some(&prev), &curr);
        assert!(diff.created.is_empty());
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].old_value, Some(Value::Number(1.0)));
        assert_eq!(diff.modified[0].new_value, Some(Value::Number(2.0)));
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].name, "gone");
    }

    #[test]
    fn test_equivalent_representations_not_modified() {
        let engine = StateDiffEngine::new();
        let prev: Snapshot = serde_json::from_str(r#"{"a": 5}"#).unwrap();
        let curr: Snapshot = serde_json::from_str(r#"{"a": 5.0}"#).unwrap();

        let diff = engine.diff(Some(&prev), &curr);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_trace_diffs_length_matches() {
        let normalizer = TraceNormalizer::new("a = 5\nb = 3");
        let processed = normalizer.process(&[
            RawStep::at_line(1, snapshot(&[("a", 5.0)])),
            RawStep::at_line(2, snapshot(&[("a", 5.0), ("b", 3.0)])),
        ]);

        let diffs = StateDiffEngine::new().trace_diffs(&processed);
        assert_eq!(diffs.len(), processed.len());
        assert_eq!(diffs[0].created.len(), 1);
        assert_eq!(diffs[1].created[0].name, "b");
    }

    #[test]
    fn test_display_formats() {
        let created = VariableChange::created("a", Value::Number(5.0));
        assert_eq!(created.to_string(), "a created = 5");

        let modified = VariableChange::modified("a", Value::Number(1.0), Value::Number(2.0));
        assert_eq!(modified.to_string(), "a changed: 1 → 2");

        let removed = VariableChange::removed("a", Value::Number(3.0));
        assert_eq!(removed.to_string(), "a removed (was 3)");

        assert_eq!(StateDiff::default().to_string(), "No changes");
    }
}
