//! Collection Registry: lazy, memoized per-source handles
//! on the vector store.

use crate::error::Result;
use crate::store::VectorStore;
use crate::types::DataSource;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Caches which collections have already been opened, so repeated
/// `open` calls for the same source don't re-issue the store's
/// open-or-create call. Read-mostly and safe for concurrent readers;
/// insert/evict are rare and serialized behind the write lock.
pub struct CollectionRegistry {
    store: Arc<dyn VectorStore>,
    opened: RwLock<HashSet<DataSource>>,
}

impl CollectionRegistry {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            opened: RwLock::new(HashSet::new()),
        }
    }

    /// Return the collection name for `source`, creating it in the
    /// vector store if this process hasn't opened it yet. Failure is
    /// propagated to the caller.
    pub async fn open(&self, source: DataSource) -> Result<String> {
        let name = source.collection_name();

        {
            let opened = self.opened.read().await;
            if opened.contains(&source) {
                return Ok(name);
            }
        }

        self.store.open_or_create(&name).await?;

        let mut opened = self.opened.write().await;
        opened.insert(source);
        Ok(name)
    }

    /// Delete the backing collection and evict the cache entry.
    /// Failure is logged and swallowed: the caller's intent (the
    /// collection should not exist) is already satisfied on not-found.
    pub async fn drop_collection(&self, source: DataSource) {
        let name = source.collection_name();
        if let Err(err) = self.store.drop_collection(&name).await {
            tracing::warn!(source = %source, error = %err, "collection drop failed, ignoring");
        }
        self.forget(source).await;
    }

    /// Evict the cache entry without deleting, for use after an
    /// external drop of the collection.
    pub async fn forget(&self, source: DataSource) {
        let mut opened = self.opened.write().await;
        opened.remove(&source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryVectorStore;

    #[tokio::test]
    async fn open_caches_after_first_call() {
        let registry = CollectionRegistry::new(Arc::new(InMemoryVectorStore::new()));
        let name1 = registry.open(DataSource::Jira).await.unwrap();
        let name2 = registry.open(DataSource::Jira).await.unwrap();
        assert_eq!(name1, "collector_jira");
        assert_eq!(name1, name2);
    }

    #[tokio::test]
    async fn forget_evicts_without_deleting() {
        let registry = CollectionRegistry::new(Arc::new(InMemoryVectorStore::new()));
        registry.open(DataSource::Slack).await.unwrap();
        registry.forget(DataSource::Slack).await;
        // Re-opening after forget should succeed (re-creates the handle).
        let name = registry.open(DataSource::Slack).await.unwrap();
        assert_eq!(name, "collector_slack");
    }

    #[tokio::test]
    async fn drop_collection_swallows_store_errors() {
        // InMemoryVectorStore's drop never errors, but drop_collection
        // must not panic even when nothing was ever opened.
        let registry = CollectionRegistry::new(Arc::new(InMemoryVectorStore::new()));
        registry.drop_collection(DataSource::Github).await;
    }
}
