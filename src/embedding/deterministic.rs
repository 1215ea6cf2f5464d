//! A deterministic, dependency-free `EmbeddingProvider` for tests and
//! examples. Not a production embedding model (the real provider is an
//! external collaborator out of scope here), but it produces stable,
//! content-sensitive vectors so vector-search tests have something
//! meaningful to rank.

use super::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;

const DIMENSIONS: usize = 32;

/// Hashes overlapping word bigrams into a fixed-size bag-of-features
/// vector, then L2-normalizes it. Similar text produces similar
/// vectors; this is a test fixture, not a semantic model.
pub struct HashEmbeddingProvider;

impl HashEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut vec = vec![0f32; DIMENSIONS];
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();

        for window in words.windows(2).chain(words.chunks(1)) {
            let token = window.join(" ");
            let bucket = fnv1a(token.as_bytes()) as usize % DIMENSIONS;
            vec[bucket] += 1.0;
        }
        if words.is_empty() {
            vec[fnv1a(text.as_bytes()) as usize % DIMENSIONS] += 1.0;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_is_deterministic() {
        let provider = HashEmbeddingProvider::new();
        let a = provider.embed(&["hello world".to_string()]).await.unwrap();
        let b = provider.embed(&["hello world".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn embed_produces_one_vector_per_input() {
        let provider = HashEmbeddingProvider::new();
        let out = provider
            .embed(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.len() == DIMENSIONS));
    }

    #[tokio::test]
    async fn similar_text_is_closer_than_dissimilar_text() {
        let provider = HashEmbeddingProvider::new();
        let base = provider.embed(&["the quick brown fox".to_string()]).await.unwrap().remove(0);
        let similar = provider
            .embed(&["the quick brown fox jumps".to_string()])
            .await
            .unwrap()
            .remove(0);
        let different = provider
            .embed(&["totally unrelated subject matter here".to_string()])
            .await
            .unwrap()
            .remove(0);

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&base, &similar) > dot(&base, &different));
    }
}
