//! Retrieval collaborator boundary

use crate::chunk::KnowledgeChunk;

/// External knowledge retrieval.
///
/// Implementations are constructed explicitly and passed by reference
/// into retrieval calls; they own their connection lifecycle. An empty
/// result is not an error.
pub trait KnowledgeSource {
    /// Retrieve up to `top_k` chunks for a free-text query.
    ///
    /// `concept` optionally narrows retrieval to one category; callers
    /// fall back to an unfiltered query when a filtered one comes back
    /// empty.
    fn retrieve(
        &self,
        query: &str,
        concept: Option<&str>,
        top_k: usize,
    ) -> anyhow::Result<Vec<KnowledgeChunk>>;
}

/// Source that always returns nothing; explanations degrade to their
/// base segment
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKnowledge;

impl KnowledgeSource for NoKnowledge {
    fn retrieve(
        &self,
        _query: &str,
        _concept: Option<&str>,
        _top_k: usize,
    ) -> anyhow::Result<Vec<KnowledgeChunk>> {
        Ok(Vec::new())
    }
}
