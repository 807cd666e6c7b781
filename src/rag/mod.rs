//! RAG (Retrieval-Augmented Generation) query engine
//!
//! This module provides the full retrieval pipeline for answering
//! queries over indexed content:
//! - Strategy selection (semantic, keyword, hybrid, contextual, adaptive)
//! - Concurrent source fan-out with partial-failure recovery
//! - Multi-criteria ranking with diversity-penalized selection
//! - Token-budget truncation, response caching and request metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chatrag::config::AppConfig;
//! use chatrag::models::{RagConfig, RagRequest, RetrievalStrategy};
//! use chatrag::rag::{InMemoryCache, RagService};
//!
//! # async fn example(search: Arc<dyn chatrag::sources::VectorSearch>) -> chatrag::Result<()> {
//! let service = RagService::new(search, Arc::new(InMemoryCache::new()), &AppConfig::default());
//!
//! let config_id = service
//!     .create_config(RagConfig::new("default", RetrievalStrategy::Semantic))
//!     .await?;
//! let response = service
//!     .retrieve(&RagRequest::new("how do I install the sdk"), config_id)
//!     .await?;
//! println!("{} results", response.total_results);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cache;
pub mod config_store;
pub mod engine;
pub mod metrics;
pub mod ranker;
pub mod scoring;
pub mod service;
pub mod strategy;

pub use analyzer::QueryAnalyzer;
pub use analyzer::QueryKind;
pub use cache::cache_key;
pub use cache::CacheBackend;
pub use cache::InMemoryCache;
pub use cache::ResultCache;
pub use config_store::ConfigPersistence;
pub use config_store::MemoryConfigStore;
pub use engine::RagEngine;
pub use metrics::MetricsCollector;
pub use ranker::ResultRanker;
pub use service::RagService;
pub use strategy::Retrieved;
pub use strategy::Strategy;
pub use strategy::StrategyInput;
pub use strategy::StrategySet;
