//! Content-addressed response cache
//!
//! The cache is an optimization, never a correctness dependency: any
//! backend failure is logged and degrades to a miss.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::models::RagResponse;
use crate::models::RetrievalStrategy;

/// Key/value store collaborator holding serialized responses
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory backend with store-side TTL expiry, checked lazily on read
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if Instant::now() < entry.expires_at {
                    return Ok(Some(entry.value.clone()));
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

/// Stable cache key over the query and the config fields that shape the
/// response
#[must_use]
pub fn cache_key(
    query: &str,
    strategy: RetrievalStrategy,
    max_results: usize,
    similarity_threshold: f32,
    embedding_model: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update([0u8]);
    hasher.update(strategy.as_str().as_bytes());
    hasher.update((max_results as u64).to_le_bytes());
    hasher.update(similarity_threshold.to_le_bytes());
    hasher.update(embedding_model.as_bytes());
    hex::encode(hasher.finalize())
}

/// Read-through/write-through response cache over a [`CacheBackend`]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ResultCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Look up a cached response; any backend failure is a miss
    pub async fn get(&self, key: &str) -> Option<RagResponse> {
        match self.backend.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(response) => {
                    debug!("Cache hit: {}", key);
                    Some(response)
                }
                Err(e) => {
                    warn!("Cache entry failed to deserialize: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache get failed: {}", e);
                None
            }
        }
    }

    /// Store a response; failures are logged and swallowed
    pub async fn set(&self, key: &str, response: &RagResponse) {
        let bytes = match serde_json::to_vec(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cache serialization failed: {}", e);
                return;
            }
        };

        if let Err(e) = self.backend.set(key, bytes, self.ttl).await {
            warn!("Cache set failed: {}", e);
        }
    }
}
