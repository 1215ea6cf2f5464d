//! Navigator: resolves the current document, then
//! dispatches by `(direction, scope)` to walk structural, chunk,
//! datapoint, or context relations using per-source rules from
//! `sources.rs`.

use crate::error::Result;
use crate::hashing::parse_timestamp_ms;
use crate::registry::CollectionRegistry;
use crate::sources::{children_key, children_predicate, context_predicate, context_type, datapoint_predicate, primary_timestamp_field, resolve_parent};
use crate::store::{Predicate, StoredItemRecord, VectorStore};
use crate::types::{DataSource, Direction, MetaValue, NavigateResponse, NavigationInfo, Scope, StoredItem};
use std::sync::Arc;

pub struct Navigator {
    registry: Arc<CollectionRegistry>,
    store: Arc<dyn VectorStore>,
}

impl Navigator {
    pub fn new(registry: Arc<CollectionRegistry>, store: Arc<dyn VectorStore>) -> Self {
        Self { registry, store }
    }

    pub async fn navigate(&self, document_id: &str, direction: Direction, scope: Scope, limit: usize) -> Result<NavigateResponse> {
        let Some((source, collection, record)) = self.resolve_current(document_id).await? else {
            return Ok(NavigateResponse::not_found());
        };

        let related_records = match direction {
            Direction::Parent => self.parent(source, &collection, &record).await?,
            Direction::Children => self.children(source, &collection, document_id, &record, limit).await?,
            Direction::Prev | Direction::Next | Direction::Siblings => match scope {
                Scope::Chunk => self.chunk_scope(source, &collection, &record, direction, limit).await?,
                Scope::Datapoint => self.datapoint_scope(source, &collection, document_id, &record, direction, limit).await?,
                Scope::Context => self.context_scope(source, &collection, document_id, &record, direction, limit).await?,
            },
        };

        let related: Vec<StoredItem> = related_records.into_iter().map(|r| to_item(r, source)).collect();

        let has_prev = !related.is_empty() && matches!(direction, Direction::Prev | Direction::Siblings);
        let has_next = !related.is_empty() && matches!(direction, Direction::Next | Direction::Siblings);
        let total_siblings = if direction == Direction::Siblings { Some(related.len()) } else { None };

        Ok(NavigateResponse {
            current: Some(to_item(record.clone(), source)),
            related,
            navigation: NavigationInfo {
                has_prev,
                has_next,
                parent_id: resolve_parent(source, &record.metadata),
                context_type: context_type(source, &record.metadata),
                total_siblings,
            },
        })
    }

    async fn resolve_current(&self, document_id: &str) -> Result<Option<(DataSource, String, StoredItemRecord)>> {
        for source in DataSource::ALL {
            let collection = match self.registry.open(source).await {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(source = %source, error = %err, "failed to open collection while resolving current document");
                    continue;
                }
            };
            let mut hits = match self.store.get_by_ids(&collection, &[document_id.to_string()]).await {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!(source = %source, error = %err, "failed to read collection while resolving current document");
                    continue;
                }
            };
            if let Some(record) = hits.pop() {
                return Ok(Some((source, collection, record)));
            }
        }
        Ok(None)
    }

    async fn parent(&self, source: DataSource, collection: &str, record: &StoredItemRecord) -> Result<Vec<StoredItemRecord>> {
        let Some(parent_id) = resolve_parent(source, &record.metadata) else {
            return Ok(vec![]);
        };
        let hits = self.store.get_by_ids(collection, &[parent_id]).await?;
        Ok(hits)
    }

    async fn children(
        &self,
        source: DataSource,
        collection: &str,
        stored_id: &str,
        record: &StoredItemRecord,
        limit: usize,
    ) -> Result<Vec<StoredItemRecord>> {
        let logical_id = children_key(source, stored_id, &record.metadata);
        let predicate = children_predicate(&logical_id, stored_id);
        self.store.get_by_predicate(collection, &predicate, Some(limit)).await
    }

    async fn chunk_scope(
        &self,
        _source: DataSource,
        collection: &str,
        record: &StoredItemRecord,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<StoredItemRecord>> {
        let Some(parent_doc_id) = record.metadata.get("parentDocId").and_then(MetaValue::as_str) else {
            return Ok(vec![]);
        };
        let chunk_index = record.metadata.get("chunkIndex").and_then(MetaValue::as_f64).map(|f| f as i64);
        let total_chunks = record.metadata.get("totalChunks").and_then(MetaValue::as_f64).map(|f| f as i64);

        match direction {
            Direction::Prev => {
                let Some(index) = chunk_index else { return Ok(vec![]) };
                if index <= 0 {
                    return Ok(vec![]);
                }
                let id = format!("{parent_doc_id}_chunk_{}", index - 1);
                self.store.get_by_ids(collection, &[id]).await
            }
            Direction::Next => {
                let (Some(index), Some(total)) = (chunk_index, total_chunks) else {
                    return Ok(vec![]);
                };
                if index + 1 >= total {
                    return Ok(vec![]);
                }
                let id = format!("{parent_doc_id}_chunk_{}", index + 1);
                self.store.get_by_ids(collection, &[id]).await
            }
            Direction::Siblings => {
                let predicate = Predicate::Eq("parentDocId".to_string(), MetaValue::Str(parent_doc_id.to_string()));
                let hits = self.store.get_by_predicate(collection, &predicate, Some(limit + 1)).await?;
                Ok(hits.into_iter().filter(|r| r.id != record.id).take(limit).collect())
            }
            _ => unreachable!("chunk_scope only handles prev/next/siblings"),
        }
    }

    async fn datapoint_scope(
        &self,
        source: DataSource,
        collection: &str,
        current_id: &str,
        record: &StoredItemRecord,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<StoredItemRecord>> {
        let Some(predicate) = datapoint_predicate(source, &record.metadata) else {
            return Ok(vec![]);
        };

        let mut hits = self
            .store
            .get_by_predicate(collection, &predicate, Some(limit + 10))
            .await?;

        let field = primary_timestamp_field(source);
        hits.sort_by_key(|r| timestamp_sort_key(r, field));

        let Some(idx) = hits.iter().position(|r| r.id == current_id) else {
            return Ok(vec![]);
        };

        Ok(match direction {
            Direction::Prev => {
                let start = idx.saturating_sub(limit);
                hits[start..idx].to_vec()
            }
            Direction::Next => {
                let end = (idx + 1 + limit).min(hits.len());
                hits[idx + 1..end].to_vec()
            }
            Direction::Siblings => hits
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, r)| r)
                .take(limit)
                .collect(),
            _ => unreachable!("datapoint_scope only handles prev/next/siblings"),
        })
    }

    async fn context_scope(
        &self,
        source: DataSource,
        collection: &str,
        current_id: &str,
        record: &StoredItemRecord,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<StoredItemRecord>> {
        // Siblings reuse the finer parentDocId grouping (same as chunk
        // siblings) when available; prev/next fall through to the
        // coarser per-source context predicate.
        let predicate = if direction == Direction::Siblings {
            record
                .metadata
                .get("parentDocId")
                .and_then(MetaValue::as_str)
                .map(|v| Predicate::Eq("parentDocId".to_string(), MetaValue::Str(v.to_string())))
                .or_else(|| context_predicate(source, &record.metadata))
        } else {
            context_predicate(source, &record.metadata)
        };

        let Some(predicate) = predicate else {
            return Ok(vec![]);
        };

        let hits = self.store.get_by_predicate(collection, &predicate, Some(limit + 1)).await?;
        Ok(hits.into_iter().filter(|r| r.id != current_id).take(limit).collect())
    }
}

fn timestamp_sort_key(record: &StoredItemRecord, field: &str) -> i64 {
    match record.metadata.get(field) {
        Some(MetaValue::Str(s)) => parse_timestamp_ms(s).unwrap_or(0),
        Some(MetaValue::Num(n)) => *n as i64,
        _ => 0,
    }
}

fn to_item(record: StoredItemRecord, source: DataSource) -> StoredItem {
    StoredItem {
        id: record.id,
        content: record.content,
        metadata: record.metadata,
        score: 1.0,
        source: Some(source),
    }
}
