//! Retrieval orchestration: validate -> cache -> dispatch -> rank -> record

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::ConversationTurn;
use crate::models::RagConfig;
use crate::models::RagRequest;
use crate::models::RagResponse;
use crate::rag::cache;
use crate::rag::cache::CacheBackend;
use crate::rag::cache::ResultCache;
use crate::rag::metrics::MetricsCollector;
use crate::rag::ranker::ResultRanker;
use crate::rag::strategy::StrategyInput;
use crate::rag::strategy::StrategySet;
use crate::sources::SourcePool;
use crate::sources::VectorSearch;

/// The retrieval engine.
///
/// Collaborators are injected at construction; the engine holds no global
/// state beyond what it is handed.
pub struct RagEngine {
    strategies: StrategySet,
    ranker: ResultRanker,
    cache: ResultCache,
    metrics: Arc<MetricsCollector>,
    retry_backoff: Duration,
    fetch_multiplier: usize,
}

impl RagEngine {
    #[must_use]
    pub fn new(
        search: Arc<dyn VectorSearch>,
        cache_backend: Arc<dyn CacheBackend>,
        metrics: Arc<MetricsCollector>,
        config: &AppConfig,
    ) -> Self {
        let sources = Arc::new(SourcePool::new(
            search,
            Duration::from_millis(config.retrieval.source_timeout_ms),
        ));

        Self {
            strategies: StrategySet::new(sources, config.retrieval.history_window),
            ranker: ResultRanker::new(config.ranking.clone()),
            cache: ResultCache::new(cache_backend, Duration::from_secs(config.cache.ttl_secs)),
            metrics,
            retry_backoff: Duration::from_millis(config.retrieval.retry_backoff_ms),
            fetch_multiplier: config.retrieval.fetch_multiplier,
        }
    }

    /// Retrieve without conversation history
    pub async fn retrieve(&self, request: &RagRequest, config: &RagConfig) -> Result<RagResponse> {
        self.retrieve_with_history(request, config, &[]).await
    }

    /// Run the full retrieval pipeline for one request
    pub async fn retrieve_with_history(
        &self,
        request: &RagRequest,
        config: &RagConfig,
        history: &[ConversationTurn],
    ) -> Result<RagResponse> {
        // Step 1: validation, before any I/O
        if let Err(e) = request.validate_against(config) {
            self.metrics.record_failure();
            return Err(e);
        }

        let query = request.query.trim();
        let max_results = request.effective_max_results(config);
        let threshold = request.effective_threshold(config);

        // Step 2: cache lookup, keyed over the effective request shape
        let key = cache::cache_key(
            query,
            config.strategy,
            max_results,
            threshold,
            &config.embedding_model,
        );
        let cache_started = Instant::now();
        if let Some(mut response) = self.cache.get(&key).await {
            response.cached = true;
            response.cache_hit = true;
            self.metrics
                .record_success(0.0, cache_started.elapsed().as_secs_f64());
            debug!("Served from cache: {}", query);
            return Ok(response);
        }

        // Step 3: strategy dispatch, retried once after total source failure
        let strategy = self.strategies.get(config.strategy).ok_or_else(|| {
            ChatRagError::Retrieval(format!(
                "no strategy registered for {}",
                config.strategy.as_str()
            ))
        })?;
        let input = StrategyInput {
            query,
            threshold,
            limit: max_results * self.fetch_multiplier,
            history,
        };

        let retrieval_started = Instant::now();
        let retrieved = match strategy.retrieve(input).await {
            Ok(retrieved) => retrieved,
            Err(first) => {
                warn!("Retrieval failed, retrying once: {}", first);
                tokio::time::sleep(self.retry_backoff).await;
                match strategy.retrieve(input).await {
                    Ok(retrieved) => retrieved,
                    Err(second) => {
                        self.metrics.record_failure();
                        return Err(second);
                    }
                }
            }
        };
        let retrieval_time = retrieval_started.elapsed().as_secs_f64();
        debug!("Retrieved {} candidates", retrieved.hits.len());

        // Step 4: rank and truncate to the token budget
        let processing_started = Instant::now();
        let results = self.ranker.rank(
            retrieved.hits,
            query,
            config.ranking_method,
            max_results,
            config.max_context_length,
        );
        let processing_time = processing_started.elapsed().as_secs_f64();

        // Step 5: assemble, cache, record
        let response = RagResponse {
            query: query.to_string(),
            total_results: results.len(),
            context_length: results.iter().map(|r| r.token_count).sum(),
            results,
            config_used: config.id,
            retrieval_time,
            processing_time,
            sources_queried: retrieved.sources_queried,
            cached: false,
            cache_hit: false,
        };

        self.cache.set(&key, &response).await;
        self.metrics.record_success(retrieval_time, processing_time);

        info!(
            "Query completed: {} results, {} tokens, sources: {:?}",
            response.total_results, response.context_length, response.sources_queried
        );
        Ok(response)
    }
}
