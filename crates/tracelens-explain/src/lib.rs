//! Leveled explanation synthesis over the trace-analysis pipeline

mod explainer;
mod level;
mod render;
mod retriever;

pub use explainer::{EnrichedStep, ExplainedTrace, TraceExplainer};
pub use level::ExplanationLevel;
pub use retriever::KnowledgeRetriever;
