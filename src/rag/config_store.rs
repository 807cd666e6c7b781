//! Named retrieval-config storage
//!
//! The in-memory store is the minimal implementation; an external
//! persistent store can be swapped in behind [`ConfigPersistence`].
//! Update and delete are idempotent and report unknown ids as `false`
//! rather than failing, to keep admin tooling retry-safe.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::RagConfig;

/// CRUD contract for named configs
#[async_trait]
pub trait ConfigPersistence: Send + Sync {
    /// Store a new config under a freshly assigned id
    async fn create(&self, config: RagConfig) -> Result<Uuid>;

    async fn get(&self, id: Uuid) -> Result<Option<RagConfig>>;

    /// Replace the config stored under `id`; `false` when unknown
    async fn update(&self, id: Uuid, config: RagConfig) -> Result<bool>;

    /// Remove the config stored under `id`; `false` when already gone
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list(&self) -> Result<Vec<(Uuid, RagConfig)>>;
}

/// In-memory config store
#[derive(Default)]
pub struct MemoryConfigStore {
    configs: DashMap<Uuid, RagConfig>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[async_trait]
impl ConfigPersistence for MemoryConfigStore {
    async fn create(&self, mut config: RagConfig) -> Result<Uuid> {
        config.validate()?;

        let id = Uuid::new_v4();
        config.id = id;
        self.configs.insert(id, config);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RagConfig>> {
        Ok(self.configs.get(&id).map(|entry| entry.clone()))
    }

    async fn update(&self, id: Uuid, mut config: RagConfig) -> Result<bool> {
        config.validate()?;

        if !self.configs.contains_key(&id) {
            return Ok(false);
        }
        config.id = id;
        self.configs.insert(id, config);
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.configs.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<(Uuid, RagConfig)>> {
        let mut configs: Vec<(Uuid, RagConfig)> = self
            .configs
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        // DashMap iteration order is arbitrary; keep listings stable
        configs.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.0.cmp(&b.0)));
        Ok(configs)
    }
}
