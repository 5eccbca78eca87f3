//! Per-trace orchestration: normalize → diff → concepts → retrieve → render

use crate::level::ExplanationLevel;
use crate::render;
use crate::retriever::KnowledgeRetriever;
use serde::{Deserialize, Serialize};
use tracelens_core::{
    AlignmentError, ConceptExtractor, ExecutionRecord, RawStep, Snapshot, StateDiffEngine,
    TraceNormalizer,
};
use tracelens_knowledge::KnowledgeSource;
use tracing::{info, warn};

/// Final per-step output: raw data plus the synthesized explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedStep {
    pub step: usize,
    pub line: usize,
    pub variables: Snapshot,
    pub explanation: String,
}

/// Enriched trace plus pass-through program output and exception text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainedTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<EnrichedStep>,
}

/// Stateless explanation synthesizer.
///
/// Holds only its level and retrieval fan-out; each trace is processed
/// end-to-end with no state carried between calls, so independent
/// traces may run concurrently.
#[derive(Debug)]
pub struct TraceExplainer {
    level: ExplanationLevel,
    retriever: KnowledgeRetriever,
    diff_engine: StateDiffEngine,
    extractor: ConceptExtractor,
}

impl TraceExplainer {
    pub fn new(level: ExplanationLevel, top_k: usize) -> Self {
        Self {
            level,
            retriever: KnowledgeRetriever::new(top_k),
            diff_engine: StateDiffEngine::new(),
            extractor: ConceptExtractor::new(),
        }
    }

    pub fn level(&self) -> ExplanationLevel {
        self.level
    }

    /// Explain every step of a raw trace.
    ///
    /// An empty trace yields an empty result. Retrieval failures degrade
    /// to the base explanation; only an internal length misalignment
    /// aborts the trace.
    pub fn explain_trace(
        &self,
        code: &str,
        raw_trace: &[RawStep],
        knowledge: &dyn KnowledgeSource,
    ) -> Result<Vec<EnrichedStep>, AlignmentError> {
        if raw_trace.is_empty() {
            warn!("empty trace provided");
            return Ok(Vec::new());
        }

        let normalizer = TraceNormalizer::new(code);
        let steps = normalizer.process(raw_trace);
        let diffs = self.diff_engine.trace_diffs(&steps);
        let concepts = self.extractor.extract_trace(&steps, &diffs)?;

        let mut enriched = Vec::with_capacity(steps.len());
        for ((step, diff), tags) in steps.iter().zip(&diffs).zip(&concepts) {
            // Retrieval is gated on observable change plus at least one
            // concept; anything else would produce ungrounded insight
            let chunks = if diff.has_changes() && !tags.is_empty() {
                self.retriever
                    .retrieve_for_step(knowledge, tags, &step.source)
            } else {
                Vec::new()
            };

            let explanation = render::render_explanation(self.level, step, diff, &chunks);
            enriched.push(EnrichedStep {
                step: step.step,
                line: step.line,
                variables: step.variables.clone(),
                explanation,
            });
        }

        info!(
            steps = enriched.len(),
            level = %self.level,
            "generated explanations"
        );
        Ok(enriched)
    }

    /// Explain a full execution record, passing program output and
    /// exception text through unchanged
    pub fn explain_record(
        &self,
        code: &str,
        record: &ExecutionRecord,
        knowledge: &dyn KnowledgeSource,
    ) -> Result<ExplainedTrace, AlignmentError> {
        Ok(ExplainedTrace {
            output: record.output.clone(),
            error: record.error.clone(),
            steps: self.explain_trace(code, &record.trace, knowledge)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelens_knowledge::NoKnowledge;

    #[test]
    fn test_empty_trace_is_not_an_error() {
        let explainer = TraceExplainer::new(ExplanationLevel::Medium, 3);
        let steps = explainer.explain_trace("a = 5", &[], &NoKnowledge).unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_record_passes_output_through() {
        let explainer = TraceExplainer::new(ExplanationLevel::Medium, 3);
        let record = ExecutionRecord {
            output: Some("8".to_string()),
            error: None,
            trace: Vec::new(),
        };

        let explained = explainer.explain_record("", &record, &NoKnowledge).unwrap();
        assert_eq!(explained.output.as_deref(), Some("8"));
        assert!(explained.error.is_none());
        assert!(explained.steps.is_empty());
    }
}
