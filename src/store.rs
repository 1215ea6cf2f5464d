//! The vector store boundary: an async trait the engine calls through,
//! a small predicate AST mirroring the capabilities required in the
//! design, and an in-memory reference implementation used by tests.

pub mod memory;

use crate::error::{EngineError, Result};
use crate::types::{DataSource, MetaValue, Metadata};
use async_trait::async_trait;

/// A record the engine writes to a collection.
#[derive(Debug, Clone)]
pub struct StoredItemWrite {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Option<Vec<f32>>,
}

/// A metadata-only update (content is left untouched by the store).
#[derive(Debug, Clone)]
pub struct MetadataUpdate {
    pub id: String,
    pub metadata: Metadata,
}

/// A record as read back from a collection.
#[derive(Debug, Clone)]
pub struct StoredItemRecord {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// Equality / range / boolean composition over flattened metadata
/// fields, the predicate shape the vector store is required to accept
///.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(String, MetaValue),
    Gte(String, f64),
    Lte(String, f64),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Build the canonical AND-conjunction of a list of predicates:
    /// `None` if empty, the single predicate if one, `And(..)` otherwise.
    pub fn conjunction(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }
}

/// The vector store capability surface required by the engine. Treated
/// as an external collaborator: the engine never assumes a particular
/// backing database, only this interface.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn open_or_create(&self, collection: &str) -> Result<()>;
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    async fn upsert(&self, collection: &str, items: Vec<StoredItemWrite>) -> Result<()>;
    async fn update_metadata(&self, collection: &str, updates: Vec<MetadataUpdate>) -> Result<()>;

    async fn get_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<StoredItemRecord>>;
    async fn get_by_predicate(
        &self,
        collection: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<StoredItemRecord>>;

    /// Vector similarity query; returns `(record, distance)` pairs. The
    /// engine converts distance to score via `score = max(0, 1 - distance)`.
    async fn query_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<(StoredItemRecord, f32)>>;

    /// Substring (`$contains`) query: every term in `terms` must appear
    /// (case-insensitively) in the returned item's content.
    async fn query_substring(
        &self,
        collection: &str,
        terms: &[String],
        predicate: Option<&Predicate>,
    ) -> Result<Vec<StoredItemRecord>>;

    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<()>;
    async fn delete_by_predicate(&self, collection: &str, predicate: &Predicate) -> Result<()>;
}

pub(crate) fn store_unavailable(source: DataSource, message: impl Into<String>) -> EngineError {
    EngineError::StoreUnavailable {
        source,
        message: message.into(),
    }
}
