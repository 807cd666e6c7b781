//! Vector-search collaborator interface and source adapters
//!
//! The engine never talks to a concrete vector store. It consumes the
//! narrow [`VectorSearch`] trait and normalizes the heterogeneous hit
//! shapes of the two collections into the internal [`RawHit`] form.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::RawHit;
use crate::models::SourceKind;
use crate::models::SourceType;

/// Raw hit from the knowledge-base collection
#[derive(Debug, Clone)]
pub struct KnowledgeHit {
    pub document_id: String,
    pub chunk_index: i32,
    pub content: String,
    pub similarity: f32,
    pub created_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Raw hit from the conversation-message collection
#[derive(Debug, Clone)]
pub struct MessageHit {
    pub message_id: String,
    pub conversation_id: Option<Uuid>,
    pub role: String,
    pub content: String,
    pub similarity: f32,
    pub created_at: DateTime<Utc>,
}

/// Semantic k-NN search over the two indexed collections
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search_knowledge(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<KnowledgeHit>>;

    async fn search_messages(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<MessageHit>>;
}

/// Thin adapter over the collaborator, applying a per-call timeout and
/// normalizing hits
pub struct SourcePool {
    search: Arc<dyn VectorSearch>,
    timeout: Duration,
}

impl SourcePool {
    #[must_use]
    pub fn new(search: Arc<dyn VectorSearch>, timeout: Duration) -> Self {
        Self { search, timeout }
    }

    /// Query the knowledge base, tagging hits with their origin
    pub async fn query_knowledge(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RawHit>> {
        let hits = tokio::time::timeout(
            self.timeout,
            self.search.search_knowledge(query, threshold, limit),
        )
        .await
        .map_err(|_| {
            ChatRagError::Retrieval(format!(
                "knowledge search timed out after {}ms",
                self.timeout.as_millis()
            ))
        })??;

        Ok(hits.into_iter().map(knowledge_hit_to_raw).collect())
    }

    /// Query the conversation-message store, tagging hits with their origin
    pub async fn query_messages(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RawHit>> {
        let hits = tokio::time::timeout(
            self.timeout,
            self.search.search_messages(query, threshold, limit),
        )
        .await
        .map_err(|_| {
            ChatRagError::Retrieval(format!(
                "message search timed out after {}ms",
                self.timeout.as_millis()
            ))
        })??;

        Ok(hits.into_iter().map(message_hit_to_raw).collect())
    }
}

fn knowledge_hit_to_raw(hit: KnowledgeHit) -> RawHit {
    RawHit {
        content: hit.content,
        source: SourceKind::KnowledgeBase,
        source_type: SourceType::Document,
        source_id: hit.document_id,
        similarity_score: hit.similarity,
        chunk_index: hit.chunk_index,
        created_at: hit.created_at,
        metadata: hit.metadata,
    }
}

fn message_hit_to_raw(hit: MessageHit) -> RawHit {
    let mut metadata = HashMap::new();
    metadata.insert("role".to_string(), serde_json::Value::String(hit.role));
    if let Some(conversation_id) = hit.conversation_id {
        metadata.insert(
            "conversation_id".to_string(),
            serde_json::Value::String(conversation_id.to_string()),
        );
    }

    RawHit {
        content: hit.content,
        source: SourceKind::Conversation,
        source_type: SourceType::Message,
        source_id: hit.message_id,
        similarity_score: hit.similarity,
        chunk_index: 0,
        created_at: hit.created_at,
        metadata,
    }
}
