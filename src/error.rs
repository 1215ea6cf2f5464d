//! Error taxonomy for the indexing-and-retrieval engine.
//!
//! Mirrors the five kinds named in the design: `StoreUnavailable` and
//! `EmbeddingFailure` wrap a failing collaborator, `NotFound` is carried
//! only where callers need to distinguish "not an error" from "missing",
//! `MalformedInput` is raised before any store call, and
//! `PartialBatchFailure` reports how far an upsert call got before a
//! later batch failed.

use crate::types::DataSource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vector store unavailable for source {source:?}: {message}")]
    StoreUnavailable { source: DataSource, message: String },

    #[error("embedding provider failed: {message}")]
    EmbeddingFailure { message: String },

    #[error("not found: {id}")]
    NotFound { id: String },

    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    #[error(
        "partial batch failure for source {source:?}: {batches_committed} batch(es) committed before failure: {message}"
    )]
    PartialBatchFailure {
        source: DataSource,
        batches_committed: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
