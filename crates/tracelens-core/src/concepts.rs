//! Concept extraction: semantic tags from lexical, state-diff, and event signals
//!
//! Implemented as an ordered table of independent predicate rules over
//! (source text, diff, event context). Every rule runs; matches are
//! unioned, deduplicated, and sorted.

use crate::diff::StateDiff;
use crate::error::AlignmentError;
use crate::step::{EventKind, ProcessedStep};
use crate::value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Closed vocabulary of semantic labels.
///
/// Variants are kept in alphabetical order so the derived `Ord` matches
/// the sorted string order of the serialized names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConceptTag {
    Arithmetic,
    Assignment,
    Comparison,
    Conditional,
    ExceptionHandling,
    FunctionCall,
    FunctionReturn,
    Growth,
    Indexing,
    Iteration,
    ListComprehension,
    LogicalOperation,
    Mapping,
    Mutation,
    Numeric,
    OrderedCollection,
    Recursion,
    ScopeExit,
    Shrink,
    Text,
}

impl ConceptTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptTag::Arithmetic => "arithmetic",
            ConceptTag::Assignment => "assignment",
            ConceptTag::Comparison => "comparison",
            ConceptTag::Conditional => "conditional",
            ConceptTag::ExceptionHandling => "exception_handling",
            ConceptTag::FunctionCall => "function_call",
            ConceptTag::FunctionReturn => "function_return",
            ConceptTag::Growth => "growth",
            ConceptTag::Indexing => "indexing",
            ConceptTag::Iteration => "iteration",
            ConceptTag::ListComprehension => "list_comprehension",
            ConceptTag::LogicalOperation => "logical_operation",
            ConceptTag::Mapping => "mapping",
            ConceptTag::Mutation => "mutation",
            ConceptTag::Numeric => "numeric",
            ConceptTag::OrderedCollection => "ordered_collection",
            ConceptTag::Recursion => "recursion",
            ConceptTag::ScopeExit => "scope_exit",
            ConceptTag::Shrink => "shrink",
            ConceptTag::Text => "text",
        }
    }
}

impl fmt::Display for ConceptTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may look at for one step
struct RuleCtx<'a> {
    source: &'a str,
    lowered: &'a str,
    diff: &'a StateDiff,
    event: EventKind,
    prev_depth: usize,
    depth: usize,
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

static CONDITIONAL_RE: OnceLock<Regex> = OnceLock::new();
static LOOP_RE: OnceLock<Regex> = OnceLock::new();
static FUNCTION_RE: OnceLock<Regex> = OnceLock::new();
static EXCEPTION_RE: OnceLock<Regex> = OnceLock::new();
static LOGICAL_RE: OnceLock<Regex> = OnceLock::new();
static CALL_RE: OnceLock<Regex> = OnceLock::new();
static COMPREHENSION_RE: OnceLock<Regex> = OnceLock::new();
static TEXT_LITERAL_RE: OnceLock<Regex> = OnceLock::new();

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/", "//", "%", "**"];
const COMPARISON_OPS: &[&str] = &["==", "!=", "<", ">", "<=", ">="];

// Lexical rules (word-boundary matching avoids keyword substrings
// inside identifiers)

fn has_conditional_keyword(ctx: &RuleCtx) -> bool {
    cached(&CONDITIONAL_RE, r"\b(if|elif|else)\b").is_match(ctx.lowered)
}

fn has_loop_keyword(ctx: &RuleCtx) -> bool {
    cached(&LOOP_RE, r"\b(for|while|in)\b").is_match(ctx.lowered)
}

fn has_function_keyword(ctx: &RuleCtx) -> bool {
    cached(&FUNCTION_RE, r"\b(def|return)\b").is_match(ctx.lowered)
}

fn has_exception_keyword(ctx: &RuleCtx) -> bool {
    cached(&EXCEPTION_RE, r"\b(try|except|finally|raise)\b").is_match(ctx.lowered)
}

fn has_logical_operator(ctx: &RuleCtx) -> bool {
    cached(&LOGICAL_RE, r"\b(and|or|not)\b").is_match(ctx.lowered)
}

fn has_arithmetic_operator(ctx: &RuleCtx) -> bool {
    ARITHMETIC_OPS.iter().any(|op| ctx.source.contains(op))
}

fn has_comparison_operator(ctx: &RuleCtx) -> bool {
    COMPARISON_OPS.iter().any(|op| ctx.source.contains(op))
}

fn has_assignment_operator(ctx: &RuleCtx) -> bool {
    // Equality and inequality are explicitly excluded
    ctx.source.contains('=') && !ctx.source.contains("==") && !ctx.source.contains("!=")
}

fn has_bracket_pair(ctx: &RuleCtx) -> bool {
    ctx.source.contains('[') && ctx.source.contains(']')
}

fn has_call_syntax(ctx: &RuleCtx) -> bool {
    cached(&CALL_RE, r"\w+\s*\(").is_match(ctx.source)
}

fn has_comprehension(ctx: &RuleCtx) -> bool {
    cached(&COMPREHENSION_RE, r"\[.*for.*in.*\]").is_match(ctx.source)
}

fn has_mapping_literal(ctx: &RuleCtx) -> bool {
    ctx.source.contains('{') && ctx.source.contains(':') && ctx.source.contains('}')
}

fn has_text_literal(ctx: &RuleCtx) -> bool {
    cached(&TEXT_LITERAL_RE, r#"["'].*["']"#).is_match(ctx.source)
}

// State-diff rules

fn created_category(ctx: &RuleCtx, want: fn(&Value) -> bool) -> bool {
    ctx.diff
        .created
        .iter()
        .filter_map(|change| change.new_value.as_ref())
        .any(want)
}

fn any_created(ctx: &RuleCtx) -> bool {
    !ctx.diff.created.is_empty()
}

fn created_sequence(ctx: &RuleCtx) -> bool {
    created_category(ctx, |v| matches!(v, Value::Sequence(_)))
}

fn created_mapping(ctx: &RuleCtx) -> bool {
    created_category(ctx, |v| matches!(v, Value::Mapping(_)))
}

fn created_numeric(ctx: &RuleCtx) -> bool {
    created_category(ctx, Value::is_numeric)
}

fn created_text(ctx: &RuleCtx) -> bool {
    created_category(ctx, |v| matches!(v, Value::Text(_)))
}

fn any_modified(ctx: &RuleCtx) -> bool {
    !ctx.diff.modified.is_empty()
}

fn numeric_modification(ctx: &RuleCtx) -> bool {
    ctx.diff.modified.iter().any(|change| {
        matches!(
            (&change.old_value, &change.new_value),
            (Some(old), Some(new)) if old.is_numeric() && new.is_numeric()
        )
    })
}

fn sequence_lengths(change: &crate::diff::VariableChange) -> Option<(usize, usize)> {
    let old = change.old_value.as_ref()?.as_sequence()?;
    let new = change.new_value.as_ref()?.as_sequence()?;
    Some((old.len(), new.len()))
}

fn sequence_grew(ctx: &RuleCtx) -> bool {
    ctx.diff
        .modified
        .iter()
        .filter_map(sequence_lengths)
        .any(|(old, new)| new > old)
}

fn sequence_shrank(ctx: &RuleCtx) -> bool {
    ctx.diff
        .modified
        .iter()
        .filter_map(sequence_lengths)
        .any(|(old, new)| new < old)
}

fn any_removed(ctx: &RuleCtx) -> bool {
    !ctx.diff.removed.is_empty()
}

// Event/depth rules

fn depth_increased_or_call(ctx: &RuleCtx) -> bool {
    ctx.depth > ctx.prev_depth || ctx.event == EventKind::Call
}

fn depth_decreased_or_return(ctx: &RuleCtx) -> bool {
    ctx.depth < ctx.prev_depth || ctx.event == EventKind::Return
}

static RULES: &[(ConceptTag, fn(&RuleCtx) -> bool)] = &[
    // Lexical
    (ConceptTag::Conditional, has_conditional_keyword),
    (ConceptTag::Iteration, has_loop_keyword),
    (ConceptTag::FunctionCall, has_function_keyword),
    (ConceptTag::ExceptionHandling, has_exception_keyword),
    (ConceptTag::LogicalOperation, has_logical_operator),
    (ConceptTag::Arithmetic, has_arithmetic_operator),
    (ConceptTag::Comparison, has_comparison_operator),
    (ConceptTag::Assignment, has_assignment_operator),
    (ConceptTag::Indexing, has_bracket_pair),
    (ConceptTag::FunctionCall, has_call_syntax),
    (ConceptTag::ListComprehension, has_comprehension),
    (ConceptTag::Mapping, has_mapping_literal),
    (ConceptTag::Text, has_text_literal),
    // State diff
    (ConceptTag::Assignment, any_created),
    (ConceptTag::OrderedCollection, created_sequence),
    (ConceptTag::Mapping, created_mapping),
    (ConceptTag::Numeric, created_numeric),
    (ConceptTag::Text, created_text),
    (ConceptTag::Mutation, any_modified),
    (ConceptTag::Arithmetic, numeric_modification),
    (ConceptTag::Growth, sequence_grew),
    (ConceptTag::Shrink, sequence_shrank),
    (ConceptTag::ScopeExit, any_removed),
    // Event / call depth
    (ConceptTag::FunctionCall, depth_increased_or_call),
    (ConceptTag::FunctionReturn, depth_decreased_or_return),
];

/// Extracts semantic concepts from execution steps
#[derive(Debug, Default)]
pub struct ConceptExtractor;

impl ConceptExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Sorted, deduplicated union of every matching rule for one step
    pub fn extract(
        &self,
        step: &ProcessedStep,
        diff: &StateDiff,
        prev_step: Option<&ProcessedStep>,
    ) -> Vec<ConceptTag> {
        let lowered = step.source.to_lowercase();
        let ctx = RuleCtx {
            source: &step.source,
            lowered: &lowered,
            diff,
            event: step.event,
            prev_depth: prev_step.map(|p| p.call_stack_depth).unwrap_or(0),
            depth: step.call_stack_depth,
        };

        let mut tags: Vec<ConceptTag> = RULES
            .iter()
            .filter(|(_, applies)| applies(&ctx))
            .map(|(tag, _)| *tag)
            .collect();
        tags.sort_unstable();
        tags.dedup();

        debug!(line = step.line, ?tags, "extracted concepts");
        tags
    }

    /// Per-step concepts for a whole trace paired with its diffs.
    ///
    /// Refuses mismatched sequence lengths instead of silently zipping
    /// to the shorter input.
    pub fn extract_trace(
        &self,
        trace: &[ProcessedStep],
        diffs: &[StateDiff],
    ) -> Result<Vec<Vec<ConceptTag>>, AlignmentError> {
        if trace.len() != diffs.len() {
            return Err(AlignmentError {
                context: "concept extraction",
                left: trace.len(),
                right: diffs.len(),
            });
        }

        let mut all = Vec::with_capacity(trace.len());
        let mut prev_step: Option<&ProcessedStep> = None;
        for (step, diff) in trace.iter().zip(diffs) {
            all.push(self.extract(step, diff, prev_step));
            prev_step = Some(step);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{StateDiffEngine, VariableChange};
    use crate::normalize::TraceNormalizer;
    use crate::step::{RawStep, Snapshot};

    fn step_with_source(source: &str) -> ProcessedStep {
        ProcessedStep {
            step: 1,
            line: 1,
            source: source.to_string(),
            function: "main".to_string(),
            event: EventKind::Line,
            call_stack_depth: 0,
            variables: Snapshot::new(),
        }
    }

    fn extract_lexical(source: &str) -> Vec<ConceptTag> {
        ConceptExtractor::new().extract(&step_with_source(source), &StateDiff::default(), None)
    }

    #[test]
    fn test_sum_line_tags() {
        let mut diff = StateDiff::default();
        diff.created
            .push(VariableChange::created("sum_val", Value::Number(8.0)));

        let tags = ConceptExtractor::new().extract(
            &step_with_source("sum_val = a + b"),
            &diff,
            None,
        );

        assert!(tags.contains(&ConceptTag::Assignment));
        assert!(tags.contains(&ConceptTag::Arithmetic));

        let mut deduped = tags.clone();
        deduped.dedup();
        assert_eq!(tags, deduped, "tags must have no duplicates");

        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted, "tags must be sorted");
    }

    #[test]
    fn test_keyword_word_boundaries() {
        // "iffy" must not match the `if` keyword; "info" must not match `in`
        let tags = extract_lexical("iffy = info");
        assert!(!tags.contains(&ConceptTag::Conditional));
        assert!(!tags.contains(&ConceptTag::Iteration));
        assert!(tags.contains(&ConceptTag::Assignment));
    }

    #[test]
    fn test_conditional_and_comparison() {
        let tags = extract_lexical("if a == b:");
        assert!(tags.contains(&ConceptTag::Conditional));
        assert!(tags.contains(&ConceptTag::Comparison));
        // `==` excludes the assignment rule
        assert!(!tags.contains(&ConceptTag::Assignment));
    }

    #[test]
    fn test_loop_line() {
        let tags = extract_lexical("for i in range(10):");
        assert!(tags.contains(&ConceptTag::Iteration));
        assert!(tags.contains(&ConceptTag::FunctionCall));
    }

    #[test]
    fn test_exception_and_logical() {
        let tags = extract_lexical("except ValueError:");
        assert!(tags.contains(&ConceptTag::ExceptionHandling));

        let tags = extract_lexical("flag = a and b");
        assert!(tags.contains(&ConceptTag::LogicalOperation));
    }

    #[test]
    fn test_indexing_comprehension_mapping_text() {
        let tags = extract_lexical("values[0]");
        assert!(tags.contains(&ConceptTag::Indexing));

        let tags = extract_lexical("squares = [x * x for x in nums]");
        assert!(tags.contains(&ConceptTag::ListComprehension));
        assert!(tags.contains(&ConceptTag::Iteration));

        let tags = extract_lexical("ages = {\"bo\": 3}");
        assert!(tags.contains(&ConceptTag::Mapping));
        assert!(tags.contains(&ConceptTag::Text));
    }

    #[test]
    fn test_empty_source_has_no_lexical_tags() {
        assert!(extract_lexical("").is_empty());
    }

    #[test]
    fn test_created_value_categories() {
        let mut diff = StateDiff::default();
        diff.created
            .push(VariableChange::created("items", Value::Sequence(vec![])));
        diff.created.push(VariableChange::created(
            "name",
            Value::Text("bo".to_string()),
        ));

        let tags = ConceptExtractor::new().extract(&step_with_source(""), &diff, None);
        assert!(tags.contains(&ConceptTag::Assignment));
        assert!(tags.contains(&ConceptTag::OrderedCollection));
        assert!(tags.contains(&ConceptTag::Text));
    }

    #[test]
    fn test_mutation_growth_and_shrink() {
        let mut diff = StateDiff::default();
        diff.modified.push(VariableChange::modified(
            "items",
            Value::Sequence(vec![Value::Number(1.0)]),
            Value::Sequence(vec![Value::Number(1.0), Value::Number(2.0)]),
        ));

        let tags = ConceptExtractor::new().extract(&step_with_source(""), &diff, None);
        assert!(tags.contains(&ConceptTag::Mutation));
        assert!(tags.contains(&ConceptTag::Growth));
        assert!(!tags.contains(&ConceptTag::Shrink));

        let mut diff = StateDiff::default();
        diff.modified.push(VariableChange::modified(
            "items",
            Value::Sequence(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Sequence(vec![Value::Number(1.0)]),
        ));

        let tags = ConceptExtractor::new().extract(&step_with_source(""), &diff, None);
        assert!(tags.contains(&ConceptTag::Shrink));
    }

    #[test]
    fn test_numeric_modification_is_arithmetic() {
        let mut diff = StateDiff::default();
        diff.modified.push(VariableChange::modified(
            "total",
            Value::Number(1.0),
            Value::Number(3.0),
        ));

        let tags = ConceptExtractor::new().extract(&step_with_source(""), &diff, None);
        assert!(tags.contains(&ConceptTag::Arithmetic));
        assert!(tags.contains(&ConceptTag::Mutation));
    }

    #[test]
    fn test_removed_is_scope_exit() {
        let mut diff = StateDiff::default();
        diff.removed
            .push(VariableChange::removed("local", Value::Number(1.0)));

        let tags = ConceptExtractor::new().extract(&step_with_source(""), &diff, None);
        assert_eq!(tags, vec![ConceptTag::ScopeExit]);
    }

    #[test]
    fn test_depth_and_event_signals() {
        let mut call_step = step_with_source("");
        call_step.call_stack_depth = 1;
        let mut prev = step_with_source("");
        prev.call_stack_depth = 0;

        let tags =
            ConceptExtractor::new().extract(&call_step, &StateDiff::default(), Some(&prev));
        assert!(tags.contains(&ConceptTag::FunctionCall));

        let mut return_step = step_with_source("");
        return_step.event = EventKind::Return;
        let tags =
            ConceptExtractor::new().extract(&return_step, &StateDiff::default(), None);
        assert!(tags.contains(&ConceptTag::FunctionReturn));
    }

    #[test]
    fn test_trace_extraction_alignment_checked() {
        let normalizer = TraceNormalizer::new("a = 5\nb = 3");
        let processed = normalizer.process(&[
            RawStep::at_line(1, Snapshot::new()),
            RawStep::at_line(2, Snapshot::new()),
        ]);
        let diffs = StateDiffEngine::new().trace_diffs(&processed[..1]);

        let err = ConceptExtractor::new()
            .extract_trace(&processed, &diffs)
            .unwrap_err();
        assert_eq!(err.left, 2);
        assert_eq!(err.right, 1);
    }

    #[test]
    fn test_trace_extraction_tracks_previous_depth() {
        let first = step_with_source("helper()");
        let mut second = step_with_source("");
        second.step = 2;
        second.call_stack_depth = 1;

        let diffs = vec![StateDiff::default(), StateDiff::default()];
        let all = ConceptExtractor::new()
            .extract_trace(&[first, second], &diffs)
            .unwrap();

        assert_eq!(all.len(), 2);
        // Depth rose from 0 to 1 between steps
        assert!(all[1].contains(&ConceptTag::FunctionCall));
    }
}
