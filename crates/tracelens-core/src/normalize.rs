//! Trace normalizer: redundant-frame filtering, re-indexing, source attachment

use crate::step::{ProcessedStep, RawStep};
use tracing::{debug, info, warn};

/// One source line in a context window
#[derive(Debug, Clone, PartialEq)]
pub struct ContextLine {
    pub line_num: usize,
    pub content: String,
    pub is_current: bool,
}

/// Source lines surrounding a step, for locality context in rendering
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub current_line: usize,
    pub current_source: String,
    pub lines: Vec<ContextLine>,
    pub function: String,
    pub depth: usize,
}

/// Cleans raw traces into ordered, source-annotated steps
#[derive(Debug)]
pub struct TraceNormalizer {
    code_lines: Vec<String>,
}

impl TraceNormalizer {
    pub fn new(code: &str) -> Self {
        Self {
            code_lines: code.split('\n').map(str::to_string).collect(),
        }
    }

    /// Trimmed text of a 1-indexed line; out of bounds yields empty
    pub fn line_content(&self, line_num: usize) -> &str {
        if line_num >= 1 && line_num <= self.code_lines.len() {
            self.code_lines[line_num - 1].trim()
        } else {
            ""
        }
    }

    /// Filter redundant frames, attach source text, and renumber 1..N.
    ///
    /// A step is redundant when its line and full snapshot match the
    /// immediately preceding retained step; a revisit identical to an
    /// older step is kept so loop iterations stay visible. Order is
    /// never changed, and an empty trace yields an empty result.
    pub fn process(&self, raw_trace: &[RawStep]) -> Vec<ProcessedStep> {
        if raw_trace.is_empty() {
            warn!("empty trace provided");
            return Vec::new();
        }

        let mut processed: Vec<ProcessedStep> = Vec::new();
        let mut prev_retained: Option<&RawStep> = None;

        for step in raw_trace {
            if let Some(prev) = prev_retained {
                if step.line == prev.line && step.variables == prev.variables {
                    debug!(line = step.line, "filtering redundant frame");
                    continue;
                }
            }

            processed.push(ProcessedStep {
                step: processed.len() + 1,
                line: step.line,
                source: self.line_content(step.line).to_string(),
                function: step.function.clone(),
                event: step.event,
                call_stack_depth: step.call_stack_depth,
                variables: step.variables.clone(),
            });
            prev_retained = Some(step);
        }

        info!(
            raw = raw_trace.len(),
            retained = processed.len(),
            "processed trace"
        );
        processed
    }

    /// Up to `2 * window + 1` source lines centered on the step's line,
    /// clipped to file bounds
    pub fn execution_context(&self, step: &ProcessedStep, window: usize) -> ExecutionContext {
        let line_num = step.line;
        let start = line_num.saturating_sub(window).max(1);
        let end = (line_num + window).min(self.code_lines.len());

        let mut lines = Vec::new();
        for n in start..=end {
            lines.push(ContextLine {
                line_num: n,
                content: self.line_content(n).to_string(),
                is_current: n == line_num,
            });
        }

        ExecutionContext {
            current_line: line_num,
            current_source: step.source.clone(),
            lines,
            function: step.function.clone(),
            depth: step.call_stack_depth,
        }
    }
}
