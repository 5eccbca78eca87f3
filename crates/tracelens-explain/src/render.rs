//! Explanation rendering: a template table keyed by (level, segment kind)
//!
//! Adding a level means adding table rows, not new control flow.

use crate::level::ExplanationLevel;
use tracelens_core::{ProcessedStep, StateDiff, Value, VariableChange};
use tracelens_knowledge::{clean_content, split_sentences, KnowledgeChunk};

use ExplanationLevel::{Beginner, InterviewReady, Medium};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    LineIntro,
    Created,
    Modified,
    Removed,
    LineRef,
    ExecutionStart,
}

use SegmentKind::{Created, ExecutionStart, LineIntro, LineRef, Modified, Removed};

struct SegmentCtx<'a> {
    line: usize,
    source: &'a str,
    change: Option<&'a VariableChange>,
}

/// Inline value rendering shared by every level; large collections
/// summarize to a size instead of spelling out elements
fn format_value(value: &Value) -> String {
    match value {
        Value::Sequence(items) if items.len() > 5 => {
            format!("a collection with {} elements", items.len())
        }
        Value::Mapping(entries) if entries.len() > 3 => {
            format!("a mapping with {} entries", entries.len())
        }
        other => format!("`{}`", other),
    }
}

fn change_values<'a>(
    ctx: &'a SegmentCtx<'a>,
) -> Option<(&'a str, Option<&'a Value>, Option<&'a Value>)> {
    let change = ctx.change?;
    Some((
        change.name.as_str(),
        change.old_value.as_ref(),
        change.new_value.as_ref(),
    ))
}

// Fixed technical annotations for recognized value categories
// (interview_ready only)

fn creation_annotation(value: &Value) -> &'static str {
    match value {
        Value::Sequence(items) if items.is_empty() => {
            " (amortized O(1) append, O(1) indexed access)"
        }
        Value::Mapping(_) => " (O(1) average lookup, O(n) worst case)",
        _ => "",
    }
}

fn mutation_annotation(old: &Value, new: &Value) -> &'static str {
    match (old.as_sequence(), new.as_sequence()) {
        (Some(before), Some(after)) if after.len() > before.len() => " (amortized O(1) append)",
        (Some(before), Some(after)) if after.len() < before.len() => " (O(1) pop from the end)",
        (Some(_), Some(_)) => " (O(1) index assignment)",
        _ => "",
    }
}

// Beginner: full sentences with plain-language type labels

fn beginner_line_intro(ctx: &SegmentCtx) -> String {
    format!("The program executes line {}: `{}`.", ctx.line, ctx.source)
}

fn beginner_created(ctx: &SegmentCtx) -> String {
    let Some((name, _, Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!(
        "Variable `{}` is created with value {}, {}.",
        name,
        format_value(new),
        new.category().label()
    )
}

fn beginner_modified(ctx: &SegmentCtx) -> String {
    let Some((name, Some(old), Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!(
        "Variable `{}` changes from {} to {}.",
        name,
        format_value(old),
        format_value(new)
    )
}

fn beginner_removed(ctx: &SegmentCtx) -> String {
    let Some((name, _, _)) = change_values(ctx) else {
        return String::new();
    };
    format!("Variable `{}` goes out of scope.", name)
}

fn beginner_line_ref(ctx: &SegmentCtx) -> String {
    format!("The program is now on line {}.", ctx.line)
}

fn beginner_execution_start(_ctx: &SegmentCtx) -> String {
    "Program execution begins.".to_string()
}

// Medium: compact phrasing

fn medium_line_intro(ctx: &SegmentCtx) -> String {
    format!("Executing line {}: `{}`.", ctx.line, ctx.source)
}

fn medium_created(ctx: &SegmentCtx) -> String {
    let Some((name, _, Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!("`{}` = {}.", name, format_value(new))
}

fn medium_modified(ctx: &SegmentCtx) -> String {
    let Some((name, Some(old), Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!("`{}`: {} → {}.", name, format_value(old), format_value(new))
}

fn medium_removed(ctx: &SegmentCtx) -> String {
    let Some((name, _, _)) = change_values(ctx) else {
        return String::new();
    };
    format!("`{}` goes out of scope.", name)
}

fn medium_line_ref(ctx: &SegmentCtx) -> String {
    format!("Line {}.", ctx.line)
}

fn medium_execution_start(_ctx: &SegmentCtx) -> String {
    "Program execution begins.".to_string()
}

// Interview-ready: terse phrasing with cost-class annotations

fn interview_line_intro(ctx: &SegmentCtx) -> String {
    format!("L{}: `{}`.", ctx.line, ctx.source)
}

fn interview_created(ctx: &SegmentCtx) -> String {
    let Some((name, _, Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!(
        "{} = {}{}.",
        name,
        format_value(new),
        creation_annotation(new)
    )
}

fn interview_modified(ctx: &SegmentCtx) -> String {
    let Some((name, Some(old), Some(new))) = change_values(ctx) else {
        return String::new();
    };
    format!(
        "{}: {} → {}{}.",
        name,
        format_value(old),
        format_value(new),
        mutation_annotation(old, new)
    )
}

fn interview_removed(ctx: &SegmentCtx) -> String {
    let Some((name, _, _)) = change_values(ctx) else {
        return String::new();
    };
    format!("{} out of scope.", name)
}

fn interview_line_ref(ctx: &SegmentCtx) -> String {
    format!("line {}.", ctx.line)
}

fn interview_execution_start(_ctx: &SegmentCtx) -> String {
    "Execution begins.".to_string()
}

type SegmentFn = fn(&SegmentCtx) -> String;

static SEGMENTS: &[(ExplanationLevel, SegmentKind, SegmentFn)] = &[
    (Beginner, LineIntro, beginner_line_intro),
    (Beginner, Created, beginner_created),
    (Beginner, Modified, beginner_modified),
    (Beginner, Removed, beginner_removed),
    (Beginner, LineRef, beginner_line_ref),
    (Beginner, ExecutionStart, beginner_execution_start),
    (Medium, LineIntro, medium_line_intro),
    (Medium, Created, medium_created),
    (Medium, Modified, medium_modified),
    (Medium, Removed, medium_removed),
    (Medium, LineRef, medium_line_ref),
    (Medium, ExecutionStart, medium_execution_start),
    (InterviewReady, LineIntro, interview_line_intro),
    (InterviewReady, Created, interview_created),
    (InterviewReady, Modified, interview_modified),
    (InterviewReady, Removed, interview_removed),
    (InterviewReady, LineRef, interview_line_ref),
    (InterviewReady, ExecutionStart, interview_execution_start),
];

fn segment(level: ExplanationLevel, kind: SegmentKind, ctx: &SegmentCtx) -> String {
    SEGMENTS
        .iter()
        .find(|(l, k, _)| *l == level && *k == kind)
        .map(|(_, _, render)| render(ctx))
        .unwrap_or_default()
}

/// Mechanical description of the step: executed line plus every change
pub(crate) fn render_base(
    level: ExplanationLevel,
    step: &ProcessedStep,
    diff: &StateDiff,
) -> String {
    let bare = SegmentCtx {
        line: step.line,
        source: &step.source,
        change: None,
    };

    if step.step == 1 && !diff.has_changes() {
        return segment(level, ExecutionStart, &bare);
    }

    let mut parts = Vec::new();
    if !step.source.is_empty() {
        parts.push(segment(level, LineIntro, &bare));
    }

    let kinds = [
        (Created, &diff.created),
        (Modified, &diff.modified),
        (Removed, &diff.removed),
    ];
    for (kind, changes) in kinds {
        for change in changes {
            let ctx = SegmentCtx {
                line: step.line,
                source: &step.source,
                change: Some(change),
            };
            parts.push(segment(level, kind, &ctx));
        }
    }

    if parts.is_empty() {
        return segment(level, LineRef, &bare);
    }
    parts.join(" ")
}

const EXPLANATORY_MARKERS: &[&str] = &["allows", "helps", "enables", "is a", "used for"];
const TECHNICAL_MARKERS: &[&str] = &[
    "complexity",
    "time",
    "space",
    "algorithm",
    "performance",
    "memory",
];

// Title-like fragments fall below this and are skipped at the levels
// that want substance
const MIN_SENTENCE_LEN: usize = 40;

fn contains_any(sentence: &str, markers: &[&str]) -> bool {
    let lowered = sentence.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

/// Level-dependent sentence selection from the first retrieved chunk
pub(crate) fn select_insight(
    level: ExplanationLevel,
    knowledge: &[KnowledgeChunk],
) -> Option<String> {
    let first = knowledge.first()?;
    let cleaned = clean_content(&first.content, None);
    let sentences = split_sentences(&cleaned);
    if sentences.is_empty() {
        return None;
    }

    let preferred = match level {
        Beginner => sentences
            .iter()
            .find(|s| contains_any(s, EXPLANATORY_MARKERS)),
        Medium => sentences.iter().find(|s| s.len() >= MIN_SENTENCE_LEN),
        InterviewReady => sentences
            .iter()
            .find(|s| contains_any(s, TECHNICAL_MARKERS))
            .or_else(|| sentences.iter().find(|s| s.len() >= MIN_SENTENCE_LEN)),
    };

    let chosen = preferred.or_else(|| sentences.first())?;
    let mut sentence = chosen.trim().to_string();
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    Some(sentence)
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Base segment plus knowledge-grounded insight, joined with
/// level-appropriate connective phrasing
pub(crate) fn render_explanation(
    level: ExplanationLevel,
    step: &ProcessedStep,
    diff: &StateDiff,
    knowledge: &[KnowledgeChunk],
) -> String {
    let base = render_base(level, step, diff);

    match select_insight(level, knowledge) {
        Some(insight) => match level {
            Beginner => format!("{} This happens because {}", base, lowercase_first(&insight)),
            Medium | InterviewReady => format!("{} {}", base, insight),
        },
        None => base,
    }
}
