//! Upsert Pipeline: classify each logical document as
//! metadata-only or content-changed against what's already stored, then
//! batch writes to the vector store in groups of at most 100 items.

use crate::embedding::EmbeddingProvider;
use crate::error::{EngineError, Result};
use crate::preparer::{prepare, PreparedItem};
use crate::registry::CollectionRegistry;
use crate::store::{MetadataUpdate, Predicate, StoredItemWrite, VectorStore};
use crate::types::{DataSource, LogicalDocument, MetaValue};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const BATCH_SIZE: usize = 100;

pub struct UpsertPipeline {
    registry: Arc<CollectionRegistry>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl UpsertPipeline {
    pub fn new(
        registry: Arc<CollectionRegistry>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            registry,
            store,
            embedder,
        }
    }

    /// Push a batch of logical documents for one source through
    /// classification and batched writes. Empty input is a no-op.
    pub async fn upsert_documents(&self, source: DataSource, docs: &[LogicalDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let collection = self.registry.open(source).await?;

        let logical_ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
        let mut existing_by_doc = self.fetch_existing(&collection, &logical_ids).await?;

        let mut full_upsert_items: Vec<PreparedItem> = Vec::new();
        let mut metadata_only_items: Vec<PreparedItem> = Vec::new();
        let mut stale_delete_ids: Vec<String> = Vec::new();

        for doc in docs {
            let prospective = prepare(doc)?;
            let existing = existing_by_doc.remove(&doc.id).unwrap_or_default();

            let prospective_ids: HashSet<&str> = prospective.iter().map(|i| i.id.as_str()).collect();
            let existing_ids: HashSet<&str> = existing.keys().map(String::as_str).collect();

            let unchanged = prospective_ids == existing_ids
                && prospective.iter().all(|item| {
                    existing
                        .get(&item.id)
                        .map(|stored_hash| Some(stored_hash.as_str()) == item.metadata.get("_contentHash").and_then(MetaValue::as_str))
                        .unwrap_or(false)
                });

            if unchanged {
                metadata_only_items.extend(prospective);
            } else {
                let stale: Vec<String> = existing_ids
                    .difference(&prospective_ids)
                    .map(|s| s.to_string())
                    .collect();
                stale_delete_ids.extend(stale);
                full_upsert_items.extend(prospective);
            }
        }

        self.run_upsert_batches(source, &collection, full_upsert_items).await?;
        self.run_metadata_batches(source, &collection, metadata_only_items).await?;

        if !stale_delete_ids.is_empty() {
            self.store.delete_ids(&collection, &stale_delete_ids).await.map_err(|e| {
                EngineError::StoreUnavailable {
                    source,
                    message: e.to_string(),
                }
            })?;
        }

        Ok(())
    }

    /// One bulk read of everything already stored for `logical_ids`: a
    /// single `get_by_ids` covering the prior single-chunk case, plus a
    /// single `get_by_predicate` over the `Or` of per-id `parentDocId`
    /// matches covering the prior multi-chunk case. Returns, per logical
    /// id, the map of stored id to `_contentHash`.
    async fn fetch_existing(&self, collection: &str, logical_ids: &[String]) -> Result<HashMap<String, HashMap<String, String>>> {
        let mut existing: HashMap<String, HashMap<String, String>> =
            logical_ids.iter().map(|id| (id.clone(), HashMap::new())).collect();

        let by_id = self.store.get_by_ids(collection, logical_ids).await?;
        for record in by_id {
            let Some(hash) = record.metadata.get("_contentHash").and_then(MetaValue::as_str) else {
                continue;
            };
            if let Some(map) = existing.get_mut(&record.id) {
                map.insert(record.id.clone(), hash.to_string());
            }
        }

        let parent_predicate = Predicate::Or(
            logical_ids
                .iter()
                .map(|id| Predicate::Eq("parentDocId".to_string(), MetaValue::Str(id.clone())))
                .collect(),
        );
        let by_parent = self.store.get_by_predicate(collection, &parent_predicate, None).await?;
        for record in by_parent {
            let Some(parent_id) = record.metadata.get("parentDocId").and_then(MetaValue::as_str) else {
                continue;
            };
            let Some(hash) = record.metadata.get("_contentHash").and_then(MetaValue::as_str) else {
                continue;
            };
            if let Some(map) = existing.get_mut(parent_id) {
                map.insert(record.id.clone(), hash.to_string());
            }
        }

        Ok(existing)
    }

    async fn run_upsert_batches(&self, source: DataSource, collection: &str, items: Vec<PreparedItem>) -> Result<()> {
        let mut batches_committed = 0usize;

        for batch in items.chunks(BATCH_SIZE) {
            let contents: Vec<String> = batch.iter().map(|i| i.content.clone()).collect();
            let embeddings = self.embedder.embed(&contents).await?;

            let writes: Vec<StoredItemWrite> = batch
                .iter()
                .zip(embeddings)
                .map(|(item, embedding)| StoredItemWrite {
                    id: item.id.clone(),
                    content: item.content.clone(),
                    metadata: item.metadata.clone(),
                    embedding: Some(embedding),
                })
                .collect();

            match self.store.upsert(collection, writes).await {
                Ok(()) => batches_committed += 1,
                Err(e) => {
                    return Err(EngineError::PartialBatchFailure {
                        source,
                        batches_committed,
                        message: e.to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    async fn run_metadata_batches(&self, source: DataSource, collection: &str, items: Vec<PreparedItem>) -> Result<()> {
        let mut batches_committed = 0usize;

        for batch in items.chunks(BATCH_SIZE) {
            let updates: Vec<MetadataUpdate> = batch
                .iter()
                .map(|item| MetadataUpdate {
                    id: item.id.clone(),
                    metadata: item.metadata.clone(),
                })
                .collect();

            match self.store.update_metadata(collection, updates).await {
                Ok(()) => batches_committed += 1,
                Err(e) => {
                    return Err(EngineError::PartialBatchFailure {
                        source,
                        batches_committed,
                        message: e.to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    /// Delete `id`, then sweep every item whose `parentDocId` matches it
    /// (chunk children). Both steps tolerate not-found.
    pub async fn delete_document(&self, source: DataSource, id: &str) -> Result<()> {
        let collection = self.registry.open(source).await?;
        self.store.delete_ids(&collection, &[id.to_string()]).await?;
        self.store
            .delete_by_predicate(
                &collection,
                &Predicate::Eq("parentDocId".to_string(), MetaValue::Str(id.to_string())),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_collection(&self, source: DataSource) {
        self.registry.drop_collection(source).await;
    }
}
