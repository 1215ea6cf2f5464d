//! A reference `VectorStore` backed by an in-process `HashMap`. Not a
//! production adapter (the real vector store is an external
//! collaborator out of scope here), but it implements every capability
//! the trait requires so the engine's own test suite can exercise the
//! full pipeline without a real database.

use super::{MetadataUpdate, Predicate, StoredItemRecord, StoredItemWrite, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    content: String,
    metadata: crate::types::Metadata,
    embedding: Option<Vec<f32>>,
}

impl Entry {
    fn to_record(&self, id: &str) -> StoredItemRecord {
        StoredItemRecord {
            id: id.to_string(),
            content: self.content.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Entry>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(meta: &crate::types::Metadata, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq(key, value) => meta.get(key).map(|v| v == value).unwrap_or(false),
        Predicate::Gte(key, bound) => meta.get(key).and_then(|v| v.as_f64()).map(|n| n >= *bound).unwrap_or(false),
        Predicate::Lte(key, bound) => meta.get(key).and_then(|v| v.as_f64()).map(|n| n <= *bound).unwrap_or(false),
        Predicate::And(preds) => preds.iter().all(|p| matches(meta, p)),
        Predicate::Or(preds) => preds.iter().any(|p| matches(meta, p)),
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn open_or_create(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(collection);
        Ok(())
    }

    async fn upsert(&self, collection: &str, items: Vec<StoredItemWrite>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let table = collections.entry(collection.to_string()).or_default();
        for item in items {
            table.insert(
                item.id,
                Entry {
                    content: item.content,
                    metadata: item.metadata,
                    embedding: item.embedding,
                },
            );
        }
        Ok(())
    }

    async fn update_metadata(&self, collection: &str, updates: Vec<MetadataUpdate>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let table = collections.entry(collection.to_string()).or_default();
        for update in updates {
            if let Some(entry) = table.get_mut(&update.id) {
                entry.metadata = update.metadata;
            }
        }
        Ok(())
    }

    async fn get_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<StoredItemRecord>> {
        let collections = self.collections.read().await;
        let table = match collections.get(collection) {
            Some(t) => t,
            None => return Ok(vec![]),
        };
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id).map(|e| e.to_record(id)))
            .collect())
    }

    async fn get_by_predicate(
        &self,
        collection: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<StoredItemRecord>> {
        let collections = self.collections.read().await;
        let table = match collections.get(collection) {
            Some(t) => t,
            None => return Ok(vec![]),
        };
        let mut out: Vec<StoredItemRecord> = table
            .iter()
            .filter(|(_, entry)| matches(&entry.metadata, predicate))
            .map(|(id, entry)| entry.to_record(id))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn query_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<(StoredItemRecord, f32)>> {
        let collections = self.collections.read().await;
        let table = match collections.get(collection) {
            Some(t) => t,
            None => return Ok(vec![]),
        };

        let mut scored: Vec<(StoredItemRecord, f32)> = table
            .iter()
            .filter(|(_, entry)| predicate.map(|p| matches(&entry.metadata, p)).unwrap_or(true))
            .filter_map(|(id, entry)| {
                entry.embedding.as_ref().map(|vec| {
                    let distance = cosine_distance(embedding, vec);
                    (entry.to_record(id), distance)
                })
            })
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n_results);
        Ok(scored)
    }

    async fn query_substring(
        &self,
        collection: &str,
        terms: &[String],
        predicate: Option<&Predicate>,
    ) -> Result<Vec<StoredItemRecord>> {
        let collections = self.collections.read().await;
        let table = match collections.get(collection) {
            Some(t) => t,
            None => return Ok(vec![]),
        };

        let mut out: Vec<StoredItemRecord> = table
            .iter()
            .filter(|(_, entry)| predicate.map(|p| matches(&entry.metadata, p)).unwrap_or(true))
            .filter(|(_, entry)| {
                let lower = entry.content.to_lowercase();
                terms.iter().all(|t| lower.contains(&t.to_lowercase()))
            })
            .map(|(id, entry)| entry.to_record(id))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(table) = collections.get_mut(collection) {
            for id in ids {
                table.remove(id);
            }
        }
        Ok(())
    }

    async fn delete_by_predicate(&self, collection: &str, predicate: &Predicate) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(table) = collections.get_mut(collection) {
            let to_remove: Vec<String> = table
                .iter()
                .filter(|(_, entry)| matches(&entry.metadata, predicate))
                .map(|(id, _)| id.clone())
                .collect();
            for id in to_remove {
                table.remove(&id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetaValue;
    use std::collections::BTreeMap;

    fn meta(pairs: &[(&str, MetaValue)]) -> crate::types::Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<_, _>>()
    }

    #[tokio::test]
    async fn upsert_then_get_by_id_roundtrips() {
        let store = InMemoryVectorStore::new();
        store.open_or_create("c").await.unwrap();
        store
            .upsert(
                "c",
                vec![StoredItemWrite {
                    id: "a".to_string(),
                    content: "hello".to_string(),
                    metadata: meta(&[("title", MetaValue::Str("Hi".to_string()))]),
                    embedding: None,
                }],
            )
            .await
            .unwrap();

        let got = store.get_by_ids("c", &["a".to_string()]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "hello");
    }

    #[tokio::test]
    async fn delete_by_predicate_sweeps_matching_items() {
        let store = InMemoryVectorStore::new();
        store.open_or_create("c").await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    StoredItemWrite {
                        id: "p_chunk_0".to_string(),
                        content: "a".to_string(),
                        metadata: meta(&[("parentDocId", MetaValue::Str("p".to_string()))]),
                        embedding: None,
                    },
                    StoredItemWrite {
                        id: "other".to_string(),
                        content: "b".to_string(),
                        metadata: meta(&[]),
                        embedding: None,
                    },
                ],
            )
            .await
            .unwrap();

        store
            .delete_by_predicate("c", &Predicate::Eq("parentDocId".to_string(), MetaValue::Str("p".to_string())))
            .await
            .unwrap();

        let remaining = store
            .get_by_ids("c", &["p_chunk_0".to_string(), "other".to_string()])
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "other");
    }

    #[tokio::test]
    async fn query_vector_converts_distance_ordering() {
        let store = InMemoryVectorStore::new();
        store.open_or_create("c").await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    StoredItemWrite {
                        id: "near".to_string(),
                        content: "x".to_string(),
                        metadata: meta(&[]),
                        embedding: Some(vec![1.0, 0.0]),
                    },
                    StoredItemWrite {
                        id: "far".to_string(),
                        content: "y".to_string(),
                        metadata: meta(&[]),
                        embedding: Some(vec![0.0, 1.0]),
                    },
                ],
            )
            .await
            .unwrap();

        let results = store.query_vector("c", &[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results[0].0.id, "near");
    }
}
