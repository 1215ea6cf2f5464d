//! collector-core: cross-source indexing and retrieval engine.
//!
//! Indexes documents harvested from seven heterogeneous upstream
//! sources into a vector database and exposes three operations over
//! the unified index: semantic/keyword/hybrid search, relational
//! navigation between documents, and content-hash-aware upsert/delete.
//!
//! The vector store and embedding model are external collaborators,
//! reached only through the [`store::VectorStore`] and
//! [`embedding::EmbeddingProvider`] trait boundaries; this crate ships
//! deterministic in-memory reference implementations of both
//! ([`store::memory::InMemoryVectorStore`],
//! [`embedding::deterministic::HashEmbeddingProvider`]) for its own
//! test suite.

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod navigator;
pub mod preparer;
pub mod query;
pub mod registry;
pub mod sanitize;
pub mod sources;
pub mod store;
pub mod types;
pub mod upsert;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use types::*;

use embedding::EmbeddingProvider;
use navigator::Navigator;
use query::QueryEngine;
use registry::CollectionRegistry;
use std::sync::Arc;
use store::{Predicate, VectorStore};
use upsert::UpsertPipeline;

/// The top-level engine: wires the Collection Registry, Document
/// Preparer, Upsert Pipeline, Query Engine, and Navigator over one
/// vector store and one embedding provider, and exposes the six
/// caller-facing operations.
pub struct Engine {
    config: EngineConfig,
    upsert: UpsertPipeline,
    query: QueryEngine,
    navigator: Navigator,
}

impl Engine {
    pub fn new(config: EngineConfig, store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let registry = Arc::new(CollectionRegistry::new(store.clone()));
        let upsert = UpsertPipeline::new(registry.clone(), store.clone(), embedder.clone());
        let query = QueryEngine::new(registry.clone(), store.clone(), embedder.clone());
        let navigator = Navigator::new(registry, store);

        Self {
            config,
            upsert,
            query,
            navigator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Push a batch of logical documents for one source through
    /// classification and batched writes. Empty input is a no-op.
    pub async fn upsert_documents(&self, source: DataSource, docs: &[LogicalDocument]) -> Result<()> {
        self.upsert.upsert_documents(source, docs).await
    }

    /// Delete `id` and every item whose `parentDocId` matches it. Both
    /// steps tolerate not-found.
    pub async fn delete_document(&self, source: DataSource, id: &str) -> Result<()> {
        self.upsert.delete_document(source, id).await
    }

    /// Drop a source's entire collection. Failure is logged and
    /// swallowed.
    pub async fn delete_collection(&self, source: DataSource) {
        self.upsert.delete_collection(source).await
    }

    /// Fetch one item by id. Returns `score = 1` when found.
    pub async fn get_document(&self, source: DataSource, id: &str) -> Result<Option<StoredItem>> {
        self.query.get_document(source, id).await
    }

    /// Fetch items matching a metadata predicate, each with `score = 1`.
    pub async fn get_documents_by_metadata(
        &self,
        source: DataSource,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<StoredItem>> {
        self.query.get_documents_by_metadata(source, predicate, limit).await
    }

    /// Cross-source search: fans out to every requested source in
    /// parallel, coalesces multi-chunk hits, applies relevancy boosts,
    /// and paginates.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        self.query.search(query, options).await
    }

    /// Relational navigation between documents.
    pub async fn navigate(
        &self,
        document_id: &str,
        direction: Direction,
        scope: Scope,
        limit: usize,
    ) -> Result<NavigateResponse> {
        self.navigator.navigate(document_id, direction, scope, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedding::deterministic::HashEmbeddingProvider;
    use std::collections::BTreeMap;
    use store::memory::InMemoryVectorStore;

    fn engine() -> Engine {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbeddingProvider::new());
        Engine::new(EngineConfig::default(), store, embedder)
    }

    fn doc(id: &str, content: &str) -> LogicalDocument {
        LogicalDocument {
            id: id.to_string(),
            content: content.to_string(),
            metadata: BTreeMap::new(),
            pre_chunked: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_document_roundtrips() {
        let engine = engine();
        engine
            .upsert_documents(DataSource::Jira, &[doc("jira-1", "Short issue")])
            .await
            .unwrap();

        let got = engine.get_document(DataSource::Jira, "jira-1").await.unwrap().unwrap();
        assert_eq!(got.content, "Short issue");
        assert_eq!(got.score, 1.0);
    }

    #[tokio::test]
    async fn delete_document_then_get_document_returns_none() {
        let engine = engine();
        engine
            .upsert_documents(DataSource::Jira, &[doc("jira-1", "Short issue")])
            .await
            .unwrap();
        engine.delete_document(DataSource::Jira, "jira-1").await.unwrap();

        assert!(engine.get_document(DataSource::Jira, "jira-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_and_navigate_work_end_to_end_on_a_chunked_document() {
        let engine = engine();
        let content = "x".repeat(9000);
        engine
            .upsert_documents(DataSource::Confluence, &[doc("doc1", &content)])
            .await
            .unwrap();

        let options = SearchOptions {
            sources: vec![DataSource::Confluence],
            ..SearchOptions::default()
        };
        let response = engine.search("x", &options).await.unwrap();
        assert!(!response.results.is_empty());

        let navigated = engine
            .navigate("doc1_chunk_0", Direction::Next, Scope::Chunk, 10)
            .await
            .unwrap();
        assert_eq!(navigated.related.len(), 1);
        assert_eq!(navigated.related[0].id, "doc1_chunk_1");
        assert!(navigated.navigation.has_next);
    }
}
