//! Pipeline error taxonomy

use thiserror::Error;

/// Parallel per-step sequences of mismatched length were fed into a fold.
///
/// This is a programmer-error class: the offending trace is aborted loudly
/// rather than zipped to the shorter length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {left} steps vs {right} paired entries")]
pub struct AlignmentError {
    pub context: &'static str,
    pub left: usize,
    pub right: usize,
}
