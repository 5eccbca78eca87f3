//! Per-step knowledge retrieval: query building, concept hints, fallback

use tracelens_core::ConceptTag;
use tracelens_knowledge::{KnowledgeChunk, KnowledgeSource};
use tracing::{debug, warn};

/// High-level concepts are preferred as the retrieval hint
const CONCEPT_PRIORITY: &[ConceptTag] = &[
    ConceptTag::Iteration,
    ConceptTag::Conditional,
    ConceptTag::FunctionCall,
    ConceptTag::Recursion,
    ConceptTag::ListComprehension,
    ConceptTag::ExceptionHandling,
    ConceptTag::Mapping,
    ConceptTag::OrderedCollection,
    ConceptTag::Arithmetic,
    ConceptTag::Assignment,
];

/// Builds queries and fetches knowledge for one step, degrading to an
/// empty result on any collaborator failure
#[derive(Debug, Clone)]
pub struct KnowledgeRetriever {
    top_k: usize,
}

impl KnowledgeRetriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Concept tags joined with the whitespace-collapsed source line
    pub fn build_query(concepts: &[ConceptTag], source_line: &str) -> String {
        let cleaned_source = source_line.split_whitespace().collect::<Vec<_>>().join(" ");
        if concepts.is_empty() {
            return cleaned_source;
        }

        let concept_str = concepts
            .iter()
            .map(|tag| tag.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if cleaned_source.is_empty() {
            concept_str
        } else {
            format!("{} {}", concept_str, cleaned_source)
        }
    }

    fn primary_concept(concepts: &[ConceptTag]) -> Option<ConceptTag> {
        CONCEPT_PRIORITY
            .iter()
            .find(|priority| concepts.contains(priority))
            .copied()
            .or_else(|| concepts.first().copied())
    }

    /// Retrieve chunks for a step. Tries concept-filtered retrieval
    /// first and falls back to an unfiltered query when it comes back
    /// empty; failures are logged and yield an empty list.
    pub fn retrieve_for_step(
        &self,
        source: &dyn KnowledgeSource,
        concepts: &[ConceptTag],
        source_line: &str,
    ) -> Vec<KnowledgeChunk> {
        if concepts.is_empty() && source_line.trim().is_empty() {
            warn!("no concepts or source line provided");
            return Vec::new();
        }

        let query = Self::build_query(concepts, source_line);

        if let Some(primary) = Self::primary_concept(concepts) {
            debug!(concept = primary.as_str(), query = %query, "concept-filtered retrieval");
            match source.retrieve(&query, Some(primary.as_str()), self.top_k) {
                Ok(chunks) if !chunks.is_empty() => return chunks,
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "knowledge retrieval failed");
                    return Vec::new();
                }
            }
        }

        debug!(query = %query, "unfiltered retrieval");
        match source.retrieve(&query, None, self.top_k) {
            Ok(chunks) => chunks,
            Err(err) => {
                warn!(error = %err, "knowledge retrieval failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingSource {
        calls: RefCell<Vec<Option<String>>>,
        respond_filtered: bool,
    }

    impl KnowledgeSource for RecordingSource {
        fn retrieve(
            &self,
            _query: &str,
            concept: Option<&str>,
            _top_k: usize,
        ) -> anyhow::Result<Vec<KnowledgeChunk>> {
            self.calls
                .borrow_mut()
                .push(concept.map(str::to_string));
            if concept.is_some() && !self.respond_filtered {
                return Ok(Vec::new());
            }
            Ok(vec![KnowledgeChunk::new("Loops repeat work.")])
        }
    }

    struct FailingSource;

    impl KnowledgeSource for FailingSource {
        fn retrieve(
            &self,
            _query: &str,
            _concept: Option<&str>,
            _top_k: usize,
        ) -> anyhow::Result<Vec<KnowledgeChunk>> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_build_query_joins_concepts_and_source() {
        let query = KnowledgeRetriever::build_query(
            &[ConceptTag::Arithmetic, ConceptTag::Assignment],
            "sum_val  =  a + b",
        );
        assert_eq!(query, "arithmetic assignment sum_val = a + b");
    }

    #[test]
    fn test_build_query_without_concepts() {
        let query = KnowledgeRetriever::build_query(&[], "print(x)");
        assert_eq!(query, "print(x)");
    }

    #[test]
    fn test_primary_concept_prefers_high_level() {
        let primary = KnowledgeRetriever::primary_concept(&[
            ConceptTag::Assignment,
            ConceptTag::Iteration,
            ConceptTag::Numeric,
        ]);
        assert_eq!(primary, Some(ConceptTag::Iteration));
    }

    #[test]
    fn test_primary_concept_falls_back_to_first() {
        let primary = KnowledgeRetriever::primary_concept(&[ConceptTag::Numeric]);
        assert_eq!(primary, Some(ConceptTag::Numeric));
    }

    #[test]
    fn test_filtered_result_used_when_nonempty() {
        let source = RecordingSource {
            calls: RefCell::new(Vec::new()),
            respond_filtered: true,
        };
        let retriever = KnowledgeRetriever::new(3);

        let chunks = retriever.retrieve_for_step(
            &source,
            &[ConceptTag::Iteration],
            "for i in range(3):",
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            source.calls.borrow().as_slice(),
            [Some("iteration".to_string())]
        );
    }

    #[test]
    fn test_falls_back_to_unfiltered_on_empty() {
        let source = RecordingSource {
            calls: RefCell::new(Vec::new()),
            respond_filtered: false,
        };
        let retriever = KnowledgeRetriever::new(3);

        let chunks =
            retriever.retrieve_for_step(&source, &[ConceptTag::Iteration], "for x in xs:");
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            source.calls.borrow().as_slice(),
            [Some("iteration".to_string()), None]
        );
    }

    #[test]
    fn test_failure_degrades_to_empty() {
        let retriever = KnowledgeRetriever::new(3);
        let chunks =
            retriever.retrieve_for_step(&FailingSource, &[ConceptTag::Assignment], "a = 5");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_nothing_to_query_returns_empty() {
        let retriever = KnowledgeRetriever::new(3);
        let chunks = retriever.retrieve_for_step(&FailingSource, &[], "  ");
        assert!(chunks.is_empty());
    }
}
