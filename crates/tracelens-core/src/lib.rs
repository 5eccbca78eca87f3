//! Core trace-analysis pipeline: normalization, state diffs, concept tagging

mod concepts;
mod diff;
mod error;
mod normalize;
mod step;
mod value;

pub use concepts::{ConceptExtractor, ConceptTag};
pub use diff::{ChangeKind, StateDiff, StateDiffEngine, VariableChange};
pub use error::AlignmentError;
pub use normalize::{ContextLine, ExecutionContext, TraceNormalizer};
pub use step::{EventKind, ExecutionRecord, ProcessedStep, RawStep, Snapshot};
pub use value::{Value, ValueCategory};
