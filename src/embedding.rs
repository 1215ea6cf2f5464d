//! The embedding provider boundary: `embed(texts) -> vectors`,
//! one output per input. The engine calls this once per search call for
//! `vector`/`hybrid` searches, and once per chunk during upsert.

pub mod deterministic;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
