//! Service surface: retrieval by config id plus config/metrics admin

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::ConversationTurn;
use crate::models::RagConfig;
use crate::models::RagMetrics;
use crate::models::RagRequest;
use crate::models::RagResponse;
use crate::rag::cache::CacheBackend;
use crate::rag::config_store::ConfigPersistence;
use crate::rag::config_store::MemoryConfigStore;
use crate::rag::engine::RagEngine;
use crate::rag::metrics::MetricsCollector;
use crate::sources::VectorSearch;

/// The operations exposed to the surrounding process.
///
/// Owns one engine, one config store and one metrics collector; the
/// process constructs a single long-lived instance with its collaborators
/// passed in.
pub struct RagService {
    engine: RagEngine,
    configs: Arc<dyn ConfigPersistence>,
    metrics: Arc<MetricsCollector>,
}

impl RagService {
    /// Create a service with the in-memory config store
    #[must_use]
    pub fn new(
        search: Arc<dyn VectorSearch>,
        cache_backend: Arc<dyn CacheBackend>,
        config: &AppConfig,
    ) -> Self {
        Self::with_config_store(search, cache_backend, Arc::new(MemoryConfigStore::new()), config)
    }

    /// Create a service backed by an external config store
    #[must_use]
    pub fn with_config_store(
        search: Arc<dyn VectorSearch>,
        cache_backend: Arc<dyn CacheBackend>,
        configs: Arc<dyn ConfigPersistence>,
        config: &AppConfig,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let engine = RagEngine::new(search, cache_backend, metrics.clone(), config);

        Self {
            engine,
            configs,
            metrics,
        }
    }

    /// Retrieve against the config stored under `config_id`
    pub async fn retrieve(&self, request: &RagRequest, config_id: Uuid) -> Result<RagResponse> {
        self.retrieve_with_history(request, config_id, &[]).await
    }

    /// Retrieve with conversation history for the contextual strategy
    pub async fn retrieve_with_history(
        &self,
        request: &RagRequest,
        config_id: Uuid,
        history: &[ConversationTurn],
    ) -> Result<RagResponse> {
        let config = self
            .configs
            .get(config_id)
            .await?
            .ok_or(ChatRagError::ConfigNotFound(config_id))?;

        self.engine
            .retrieve_with_history(request, &config, history)
            .await
    }

    pub async fn create_config(&self, config: RagConfig) -> Result<Uuid> {
        let id = self.configs.create(config).await?;
        info!("Created config {}", id);
        Ok(id)
    }

    pub async fn update_config(&self, id: Uuid, config: RagConfig) -> Result<bool> {
        self.configs.update(id, config).await
    }

    pub async fn delete_config(&self, id: Uuid) -> Result<bool> {
        self.configs.delete(id).await
    }

    pub async fn list_configs(&self) -> Result<Vec<(Uuid, RagConfig)>> {
        self.configs.list().await
    }

    #[must_use]
    pub fn get_metrics(&self) -> RagMetrics {
        self.metrics.snapshot()
    }

    /// Get engine reference
    #[must_use]
    pub const fn engine(&self) -> &RagEngine {
        &self.engine
    }
}
