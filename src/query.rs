//! Query Engine: parallel per-source fan-out, score
//! normalization, multi-chunk coalescing, relevancy boosts, and
//! pagination.

pub mod scoring;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::hashing::{date_end_ms, date_start_ms};
use crate::registry::CollectionRegistry;
use crate::sources::half_life_days;
use crate::store::{Predicate, VectorStore};
use crate::types::{DataSource, MetaValue, Metadata, SearchOptions, SearchResponse, SearchType, StoredItem};
use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

pub struct QueryEngine {
    registry: Arc<CollectionRegistry>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QueryEngine {
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

    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let predicate = build_where_predicate(options);
        let tokens: Vec<String> = query.split_whitespace().map(str::to_string).collect();

        let query_embedding = match options.search_type {
            SearchType::Keyword => None,
            _ => Some(self.embedder.embed(&[query.to_string()]).await?.remove(0)),
        };

        let n_results = options.limit + options.offset;

        let tasks = options.sources.iter().map(|&source| {
            let predicate = predicate.clone();
            let embedding = query_embedding.clone();
            let tokens = tokens.clone();
            async move {
                self.search_one_source(source, options.search_type, embedding, &tokens, predicate.as_ref(), n_results)
                    .await
            }
        });

        let merged: Vec<StoredItem> = join_all(tasks).await.into_iter().flatten().collect();
        let coalesced = coalesce(merged);
        let boosted = self.apply_boosts(coalesced, query);

        let mut sorted = boosted;
        sorted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = sorted.len();
        let results = sorted.into_iter().skip(options.offset).take(options.limit).collect();

        Ok(SearchResponse { results, total })
    }

    pub async fn get_document(&self, source: DataSource, id: &str) -> Result<Option<StoredItem>> {
        let collection = self.registry.open(source).await?;
        let mut got = self.store.get_by_ids(&collection, &[id.to_string()]).await?;
        Ok(got.pop().map(|record| StoredItem {
            id: record.id,
            content: record.content,
            metadata: record.metadata,
            score: 1.0,
            source: Some(source),
        }))
    }

    pub async fn get_documents_by_metadata(
        &self,
        source: DataSource,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<StoredItem>> {
        let collection = self.registry.open(source).await?;
        let records = self.store.get_by_predicate(&collection, predicate, limit).await?;
        Ok(records
            .into_iter()
            .map(|record| StoredItem {
                id: record.id,
                content: record.content,
                metadata: record.metadata,
                score: 1.0,
                source: Some(source),
            })
            .collect())
    }

    async fn search_one_source(
        &self,
        source: DataSource,
        search_type: SearchType,
        query_embedding: Option<Vec<f32>>,
        tokens: &[String],
        predicate: Option<&Predicate>,
        n_results: usize,
    ) -> Vec<StoredItem> {
        let collection = match self.registry.open(source).await {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(source = %source, error = %err, "failed to open collection, contributing zero results");
                return vec![];
            }
        };

        let outcome: Result<Vec<StoredItem>> = match search_type {
            SearchType::Vector => {
                self.vector_search(&collection, source, query_embedding.as_deref().unwrap(), n_results, predicate)
                    .await
            }
            SearchType::Keyword => self.keyword_search(&collection, source, tokens, predicate).await,
            SearchType::Hybrid => {
                match self
                    .vector_search(&collection, source, query_embedding.as_deref().unwrap(), n_results, predicate)
                    .await
                {
                    Ok(mut vector_results) => match self.keyword_search(&collection, source, tokens, predicate).await {
                        Ok(keyword_results) => {
                            merge_by_id_keep_higher(&mut vector_results, keyword_results);
                            Ok(vector_results)
                        }
                        Err(e) => Err(e),
                    },
                    Err(e) => Err(e),
                }
            }
        };

        match outcome {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(source = %source, error = %err, "search failed, contributing zero results");
                vec![]
            }
        }
    }

    async fn vector_search(
        &self,
        collection: &str,
        source: DataSource,
        embedding: &[f32],
        n_results: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<StoredItem>> {
        let hits = self.store.query_vector(collection, embedding, n_results, predicate).await?;
        Ok(hits
            .into_iter()
            .map(|(record, distance)| StoredItem {
                id: record.id,
                content: record.content,
                metadata: record.metadata,
                score: (1.0 - distance).max(0.0),
                source: Some(source),
            })
            .collect())
    }

    async fn keyword_search(
        &self,
        collection: &str,
        source: DataSource,
        tokens: &[String],
        predicate: Option<&Predicate>,
    ) -> Result<Vec<StoredItem>> {
        let hits = self.store.query_substring(collection, tokens, predicate).await?;
        Ok(hits
            .into_iter()
            .filter_map(|record| {
                let score = scoring::keyword_score(tokens, &record.content);
                if score <= 0.0 {
                    None
                } else {
                    Some(StoredItem {
                        id: record.id,
                        content: record.content,
                        metadata: record.metadata,
                        score,
                        source: Some(source),
                    })
                }
            })
            .collect())
    }

    fn apply_boosts(&self, items: Vec<StoredItem>, query: &str) -> Vec<StoredItem> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        items
            .into_iter()
            .map(|mut item| {
                let blend = scoring::relevance_blend(&item.metadata);
                let title = scoring::title_boost(&item.metadata, query);
                let half_life = item.source.map(half_life_days).unwrap_or(30.0);
                let recency = scoring::recency_boost(&item.metadata, half_life, now_ms);
                item.score = scoring::final_score(item.score, blend, title, recency);
                item
            })
            .collect()
    }
}

fn merge_by_id_keep_higher(vector_results: &mut Vec<StoredItem>, keyword_results: Vec<StoredItem>) {
    for kw in keyword_results {
        if let Some(existing) = vector_results.iter_mut().find(|v| v.id == kw.id) {
            if kw.score > existing.score {
                existing.score = kw.score;
            }
        } else {
            vector_results.push(kw);
        }
    }
}

/// Group by `parentDocId` (standalone items key by their own id), keep
/// only the highest-scoring member of each group, and apply the
/// multi-chunk synergy boost.
fn coalesce(items: Vec<StoredItem>) -> Vec<StoredItem> {
    let mut groups: HashMap<String, Vec<StoredItem>> = HashMap::new();
    for item in items {
        let key = item
            .metadata
            .get("parentDocId")
            .and_then(MetaValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| item.id.clone());
        groups.entry(key).or_default().push(item);
    }

    groups
        .into_values()
        .map(|mut group| {
            let k = group.len();
            group.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            let mut best = group.remove(0);
            best.score = scoring::coalesce_boost(best.score, k);
            best
        })
        .collect()
}

/// Compose the `where` equality predicates (primitive values only) with
/// the `startDate`/`endDate` → `createdAtTs` bounds. The canonical path
/// is numeric `createdAtTs`; the legacy ISO-string `createdAt`
/// comparison is intentionally not implemented.
fn build_where_predicate(options: &SearchOptions) -> Option<Predicate> {
    let mut predicates = Vec::new();

    for (key, value) in &options.r#where {
        match value {
            serde_json::Value::String(s) => predicates.push(Predicate::Eq(key.clone(), MetaValue::Str(s.clone()))),
            serde_json::Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    predicates.push(Predicate::Eq(key.clone(), MetaValue::Num(f)));
                }
            }
            serde_json::Value::Bool(b) => predicates.push(Predicate::Eq(key.clone(), MetaValue::Bool(*b))),
            _ => {}
        }
    }

    if let Some(start) = &options.start_date {
        if let Some(ms) = date_start_ms(start) {
            predicates.push(Predicate::Gte("createdAtTs".to_string(), ms as f64));
        }
    }
    if let Some(end) = &options.end_date {
        if let Some(ms) = date_end_ms(end) {
            predicates.push(Predicate::Lte("createdAtTs".to_string(), ms as f64));
        }
    }

    Predicate::conjunction(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::deterministic::HashEmbeddingProvider;
    use crate::store::memory::InMemoryVectorStore;
    use crate::store::StoredItemWrite;
    use std::collections::BTreeMap;

    fn engine() -> QueryEngine {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let registry = Arc::new(CollectionRegistry::new(store.clone()));
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbeddingProvider::new());
        QueryEngine::new(registry, store, embedder)
    }

    fn meta(pairs: &[(&str, MetaValue)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<_, _>>()
    }

    #[tokio::test]
    async fn where_predicate_adds_date_bounds() {
        let mut options = SearchOptions::default();
        options.start_date = Some("2024-01-01".to_string());
        let predicate = build_where_predicate(&options).unwrap();
        match predicate {
            Predicate::Gte(key, value) => {
                assert_eq!(key, "createdAtTs");
                assert_eq!(value, 1704067200000.0);
            }
            other => panic!("expected a single Gte predicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_total_reflects_post_coalesce_pre_pagination_count() {
        let engine = engine();
        let collection = engine.registry.open(DataSource::Jira).await.unwrap();
        engine
            .store
            .upsert(
                &collection,
                vec![
                    StoredItemWrite {
                        id: "a".to_string(),
                        content: "alpha".to_string(),
                        metadata: meta(&[]),
                        embedding: Some(vec![1.0, 0.0]),
                    },
                    StoredItemWrite {
                        id: "b".to_string(),
                        content: "beta".to_string(),
                        metadata: meta(&[]),
                        embedding: Some(vec![0.9, 0.1]),
                    },
                ],
            )
            .await
            .unwrap();

        let mut options = SearchOptions::default();
        options.sources = vec![DataSource::Jira];
        options.limit = 1;
        let response = engine.search("alpha", &options).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total, 2);
    }

    #[tokio::test]
    async fn missing_source_collection_contributes_zero_results_not_an_error() {
        let engine = engine();
        let mut options = SearchOptions::default();
        options.sources = vec![DataSource::Slack];
        let response = engine.search("anything", &options).await.unwrap();
        assert_eq!(response.results.len(), 0);
        assert_eq!(response.total, 0);
    }

    #[test]
    fn coalesce_keeps_one_item_per_parent_group() {
        let items = vec![
            StoredItem {
                id: "p_chunk_0".to_string(),
                content: "a".to_string(),
                metadata: meta(&[("parentDocId", MetaValue::Str("p".to_string()))]),
                score: 0.8,
                source: Some(DataSource::Jira),
            },
            StoredItem {
                id: "p_chunk_1".to_string(),
                content: "b".to_string(),
                metadata: meta(&[("parentDocId", MetaValue::Str("p".to_string()))]),
                score: 0.7,
                source: Some(DataSource::Jira),
            },
        ];
        let out = coalesce(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "p_chunk_0");
        assert!(out[0].score > 0.8);
    }
}
