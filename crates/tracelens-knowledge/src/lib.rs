//! Knowledge boundary: chunk model, retrieval trait, and a local lexical store

mod bm25;
mod chunk;
mod chunker;
mod source;
mod store;

pub use bm25::Bm25Index;
pub use chunk::{clean_content, extract_key_sentences, split_sentences, KnowledgeChunk};
pub use chunker::{
    chunk_document, chunk_text, DocumentChunk, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
pub use source::{KnowledgeSource, NoKnowledge};
pub use store::KnowledgeStore;
