use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ChatRagError;
use crate::errors::Result;

/// Retrieval strategy selecting how a query is turned into a candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Vector similarity over both content sources
    Semantic,
    /// Keyword-reduced query against the knowledge base
    Keyword,
    /// Semantic and keyword pools merged and deduplicated
    Hybrid,
    /// Semantic search over a history-augmented query
    Contextual,
    /// Query classification routing to one of the above
    Adaptive,
}

impl RetrievalStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Keyword => "keyword",
            Self::Hybrid => "hybrid",
            Self::Contextual => "contextual",
            Self::Adaptive => "adaptive",
        }
    }

    /// All concrete strategies plus the adaptive router
    pub const ALL: [Self; 5] = [
        Self::Semantic,
        Self::Keyword,
        Self::Hybrid,
        Self::Contextual,
        Self::Adaptive,
    ];
}

/// Ranking method selecting which score terms are layered on top of the
/// base similarity + relevance combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    Relevance,
    Diversity,
    Freshness,
    Authority,
}

/// Origin of a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    KnowledgeBase,
    Conversation,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::Conversation => "conversation",
        }
    }
}

/// Shape of the underlying record a hit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Document,
    Message,
}

/// Named retrieval configuration, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub strategy: RetrievalStrategy,
    pub max_context_length: usize,
    pub max_results: usize,
    pub similarity_threshold: f32,
    pub embedding_model: String,
    pub ranking_method: RankingMethod,
    pub created_at: DateTime<Utc>,
}

impl RagConfig {
    /// Create a config with a fresh id
    #[must_use]
    pub fn new(name: &str, strategy: RetrievalStrategy) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            strategy,
            max_context_length: 4000,
            max_results: 10,
            similarity_threshold: 0.7,
            embedding_model: "text-embedding-3-small".to_string(),
            ranking_method: RankingMethod::Relevance,
            created_at: Utc::now(),
        }
    }

    /// Check the config invariants
    pub fn validate(&self) -> Result<()> {
        if self.max_results < 1 {
            return Err(ChatRagError::Validation(
                "max_results must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ChatRagError::Validation(format!(
                "similarity_threshold must be in [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.max_context_length == 0 {
            return Err(ChatRagError::Validation(
                "max_context_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single retrieval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagRequest {
    pub query: String,
    pub conversation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Request-level override of the config default
    pub max_results: Option<usize>,
    /// Request-level override of the config default
    pub similarity_threshold: Option<f32>,
}

impl RagRequest {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            conversation_id: None,
            user_id: None,
            max_results: None,
            similarity_threshold: None,
        }
    }

    /// Validate the request against the resolved config, before any I/O
    pub fn validate_against(&self, config: &RagConfig) -> Result<()> {
        config.validate()?;

        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(ChatRagError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() < 3 {
            return Err(ChatRagError::Validation(
                "query must be at least 3 characters".to_string(),
            ));
        }
        if let Some(max_results) = self.max_results {
            if max_results < 1 {
                return Err(ChatRagError::Validation(
                    "max_results override must be at least 1".to_string(),
                ));
            }
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ChatRagError::Validation(format!(
                    "similarity_threshold override must be in [0, 1], got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// Effective result limit after applying the request override
    #[must_use]
    pub fn effective_max_results(&self, config: &RagConfig) -> usize {
        self.max_results.unwrap_or(config.max_results)
    }

    /// Effective similarity threshold after applying the request override
    #[must_use]
    pub fn effective_threshold(&self, config: &RagConfig) -> f32 {
        self.similarity_threshold
            .unwrap_or(config.similarity_threshold)
    }
}

/// One prior turn of the conversation, used by the contextual strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String, // "user" or "assistant"
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Unranked candidate produced by a source adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    pub content: String,
    pub source: SourceKind,
    pub source_type: SourceType,
    pub source_id: String,
    pub similarity_score: f32,
    pub chunk_index: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Ranked result included in a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResult {
    pub content: String,
    pub source: SourceKind,
    pub source_type: SourceType,
    pub source_id: String,
    pub similarity_score: f32,
    pub relevance_score: f32,
    pub ranking_score: f32,
    pub token_count: usize,
}

/// Assembled retrieval response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub query: String,
    /// Ordered by `ranking_score` descending
    pub results: Vec<RagResult>,
    pub config_used: Uuid,
    pub total_results: usize,
    /// Seconds spent in source calls
    pub retrieval_time: f64,
    /// Seconds spent scoring and ranking
    pub processing_time: f64,
    /// Sum of selected `token_count`, never above `max_context_length`
    pub context_length: usize,
    pub sources_queried: Vec<String>,
    pub cached: bool,
    pub cache_hit: bool,
}

/// Cumulative request metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_retrieval_time: f64,
    pub avg_processing_time: f64,
    pub avg_total_time: f64,
}
