//! Retrieval strategies
//!
//! One [`Strategy`] implementation per [`RetrievalStrategy`] variant,
//! selected through the [`StrategySet`] lookup table. Strategies turn a
//! query (plus optional conversation history) into an unranked candidate
//! pool; scoring and truncation happen downstream in the ranker.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;

use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::ConversationTurn;
use crate::models::RawHit;
use crate::models::RetrievalStrategy;
use crate::rag::analyzer::QueryAnalyzer;
use crate::rag::analyzer::QueryKind;
use crate::rag::scoring;
use crate::sources::SourcePool;

/// Content similarity at or above which two hits are one hit
const NEAR_DUPLICATE_THRESHOLD: f32 = 0.9;

/// Most augmentation terms the contextual strategy appends
const MAX_CONTEXT_TERMS: usize = 8;

/// Candidate pool produced by a strategy
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub hits: Vec<RawHit>,
    /// Sources that answered; failed sources are excluded
    pub sources_queried: Vec<String>,
}

/// Everything a strategy needs for one retrieval pass
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub query: &'a str,
    pub threshold: f32,
    pub limit: usize,
    pub history: &'a [ConversationTurn],
}

/// An algorithm turning a query into a candidate pool
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved>;
}

/// Deterministic pool order: similarity descending, ties by source id
fn sort_hits(hits: &mut [RawHit]) {
    hits.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
}

/// Parallel vector search over both content sources
pub struct SemanticStrategy {
    sources: Arc<SourcePool>,
}

impl SemanticStrategy {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Strategy for SemanticStrategy {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved> {
        debug!("Semantic retrieval: {}", input.query);

        let (knowledge, messages) = futures::join!(
            self.sources
                .query_knowledge(input.query, input.threshold, input.limit),
            self.sources
                .query_messages(input.query, input.threshold, input.limit),
        );

        let mut hits = Vec::new();
        let mut sources_queried = Vec::new();
        let mut failures = Vec::new();

        match knowledge {
            Ok(found) => {
                hits.extend(found);
                sources_queried.push("knowledge_base".to_string());
            }
            Err(e) => {
                warn!("Knowledge search failed: {}", e);
                failures.push(e.to_string());
            }
        }
        match messages {
            Ok(found) => {
                hits.extend(found);
                sources_queried.push("conversation".to_string());
            }
            Err(e) => {
                warn!("Message search failed: {}", e);
                failures.push(e.to_string());
            }
        }

        if sources_queried.is_empty() {
            return Err(ChatRagError::Retrieval(format!(
                "all sources failed: {}",
                failures.join("; ")
            )));
        }

        sort_hits(&mut hits);
        Ok(Retrieved {
            hits,
            sources_queried,
        })
    }
}

/// Keyword-reduced query against the knowledge base only
pub struct KeywordStrategy {
    sources: Arc<SourcePool>,
    analyzer: QueryAnalyzer,
}

impl KeywordStrategy {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>, analyzer: QueryAnalyzer) -> Self {
        Self { sources, analyzer }
    }
}

#[async_trait]
impl Strategy for KeywordStrategy {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved> {
        let keywords = self.analyzer.extract_keywords(input.query);
        let effective_query = if keywords.is_empty() {
            input.query.to_string()
        } else {
            keywords.join(" ")
        };
        debug!("Keyword retrieval: {}", effective_query);

        let mut hits = self
            .sources
            .query_knowledge(&effective_query, input.threshold, input.limit)
            .await
            .map_err(|e| ChatRagError::Retrieval(format!("all sources failed: {e}")))?;

        sort_hits(&mut hits);
        Ok(Retrieved {
            hits,
            sources_queried: vec!["knowledge_base".to_string()],
        })
    }
}

/// Semantic and keyword pools merged, near-duplicates collapsed
pub struct HybridStrategy {
    semantic: SemanticStrategy,
    keyword: KeywordStrategy,
}

impl HybridStrategy {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>, analyzer: QueryAnalyzer) -> Self {
        Self {
            semantic: SemanticStrategy::new(sources.clone()),
            keyword: KeywordStrategy::new(sources, analyzer),
        }
    }

    /// Collapse near-duplicate content, keeping the higher-scored hit.
    ///
    /// Expects `hits` sorted by similarity descending so the first of any
    /// duplicate group is the one kept.
    fn dedup_by_content(hits: Vec<RawHit>) -> Vec<RawHit> {
        let mut kept: Vec<RawHit> = Vec::with_capacity(hits.len());

        for hit in hits {
            let duplicate = kept.iter().any(|existing| {
                scoring::content_similarity(&hit.content, &existing.content)
                    >= NEAR_DUPLICATE_THRESHOLD
            });
            if !duplicate {
                kept.push(hit);
            }
        }

        kept
    }
}

#[async_trait]
impl Strategy for HybridStrategy {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved> {
        debug!("Hybrid retrieval: {}", input.query);

        let (semantic, keyword) = futures::join!(
            self.semantic.retrieve(input),
            self.keyword.retrieve(input),
        );

        let mut hits = Vec::new();
        let mut sources_queried: Vec<String> = Vec::new();
        let mut failures = Vec::new();

        for outcome in [semantic, keyword] {
            match outcome {
                Ok(retrieved) => {
                    hits.extend(retrieved.hits);
                    for source in retrieved.sources_queried {
                        if !sources_queried.contains(&source) {
                            sources_queried.push(source);
                        }
                    }
                }
                Err(e) => failures.push(e.to_string()),
            }
        }

        if sources_queried.is_empty() {
            return Err(ChatRagError::Retrieval(format!(
                "all sources failed: {}",
                failures.join("; ")
            )));
        }

        sort_hits(&mut hits);
        let hits = Self::dedup_by_content(hits);

        Ok(Retrieved {
            hits,
            sources_queried,
        })
    }
}

/// Semantic retrieval over a query augmented with salient history terms
pub struct ContextualStrategy {
    semantic: SemanticStrategy,
    analyzer: QueryAnalyzer,
    history_window: usize,
}

impl ContextualStrategy {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>, analyzer: QueryAnalyzer, history_window: usize) -> Self {
        Self {
            semantic: SemanticStrategy::new(sources),
            analyzer,
            history_window,
        }
    }

    /// Append salient terms from the last turns to the original query
    fn augment_query(&self, query: &str, history: &[ConversationTurn]) -> String {
        let recent = history
            .iter()
            .rev()
            .take(self.history_window)
            .collect::<Vec<_>>();
        if recent.is_empty() {
            return query.to_string();
        }

        let query_keywords = self.analyzer.extract_keywords(query);
        let mut terms: Vec<String> = Vec::new();

        // Oldest of the window first so term order follows the conversation
        for turn in recent.into_iter().rev() {
            for term in self.analyzer.extract_keywords(&turn.content) {
                if !query_keywords.contains(&term) && !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }
        terms.truncate(MAX_CONTEXT_TERMS);

        if terms.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, terms.join(" "))
        }
    }
}

#[async_trait]
impl Strategy for ContextualStrategy {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved> {
        let augmented = self.augment_query(input.query, input.history);
        debug!("Contextual retrieval: {}", augmented);

        self.semantic
            .retrieve(StrategyInput {
                query: &augmented,
                ..input
            })
            .await
    }
}

/// Routing layer: classifies the query and delegates
pub struct AdaptiveStrategy {
    analyzer: QueryAnalyzer,
    semantic: SemanticStrategy,
    contextual: ContextualStrategy,
    hybrid: HybridStrategy,
}

impl AdaptiveStrategy {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>, analyzer: QueryAnalyzer, history_window: usize) -> Self {
        Self {
            analyzer,
            semantic: SemanticStrategy::new(sources.clone()),
            contextual: ContextualStrategy::new(sources.clone(), analyzer, history_window),
            hybrid: HybridStrategy::new(sources, analyzer),
        }
    }

    /// The concrete strategy a query routes to
    #[must_use]
    pub fn route(&self, query: &str) -> RetrievalStrategy {
        match self.analyzer.classify(query) {
            QueryKind::Technical => RetrievalStrategy::Semantic,
            QueryKind::Conversational => RetrievalStrategy::Contextual,
            QueryKind::Specific => RetrievalStrategy::Hybrid,
        }
    }
}

#[async_trait]
impl Strategy for AdaptiveStrategy {
    async fn retrieve(&self, input: StrategyInput<'_>) -> Result<Retrieved> {
        let route = self.route(input.query);
        debug!("Adaptive routing to {}: {}", route.as_str(), input.query);

        match route {
            RetrievalStrategy::Contextual => self.contextual.retrieve(input).await,
            RetrievalStrategy::Hybrid => self.hybrid.retrieve(input).await,
            _ => self.semantic.retrieve(input).await,
        }
    }
}

/// Lookup table of all strategies, keyed by the config enum
pub struct StrategySet {
    strategies: HashMap<RetrievalStrategy, Box<dyn Strategy>>,
}

impl StrategySet {
    #[must_use]
    pub fn new(sources: Arc<SourcePool>, history_window: usize) -> Self {
        let analyzer = QueryAnalyzer::new();
        let mut strategies: HashMap<RetrievalStrategy, Box<dyn Strategy>> = HashMap::new();

        strategies.insert(
            RetrievalStrategy::Semantic,
            Box::new(SemanticStrategy::new(sources.clone())),
        );
        strategies.insert(
            RetrievalStrategy::Keyword,
            Box::new(KeywordStrategy::new(sources.clone(), analyzer)),
        );
        strategies.insert(
            RetrievalStrategy::Hybrid,
            Box::new(HybridStrategy::new(sources.clone(), analyzer)),
        );
        strategies.insert(
            RetrievalStrategy::Contextual,
            Box::new(ContextualStrategy::new(
                sources.clone(),
                analyzer,
                history_window,
            )),
        );
        strategies.insert(
            RetrievalStrategy::Adaptive,
            Box::new(AdaptiveStrategy::new(sources, analyzer, history_window)),
        );

        Self { strategies }
    }

    #[must_use]
    pub fn get(&self, strategy: RetrievalStrategy) -> Option<&dyn Strategy> {
        self.strategies.get(&strategy).map(Box::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::sources::KnowledgeHit;
    use crate::sources::MessageHit;
    use crate::sources::VectorSearch;

    /// Records every collection/query pair it answers
    struct RecordingSearch {
        calls: Mutex<Vec<(String, String)>>,
        knowledge: Vec<(String, f32)>,
        messages: Vec<(String, f32)>,
        fail_knowledge: bool,
        fail_messages: bool,
    }

    impl RecordingSearch {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                knowledge: Vec::new(),
                messages: Vec::new(),
                fail_knowledge: false,
                fail_messages: false,
            }
        }

        fn with_knowledge(mut self, content: &str, score: f32) -> Self {
            self.knowledge.push((content.to_string(), score));
            self
        }

        fn with_message(mut self, content: &str, score: f32) -> Self {
            self.messages.push((content.to_string(), score));
            self
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorSearch for RecordingSearch {
        async fn search_knowledge(
            &self,
            query: &str,
            _threshold: f32,
            _limit: usize,
        ) -> Result<Vec<KnowledgeHit>> {
            self.calls
                .lock()
                .unwrap()
                .push(("knowledge".to_string(), query.to_string()));
            if self.fail_knowledge {
                return Err(ChatRagError::Retrieval("knowledge down".to_string()));
            }
            Ok(self
                .knowledge
                .iter()
                .enumerate()
                .map(|(idx, (content, score))| KnowledgeHit {
                    document_id: format!("doc-{idx}"),
                    chunk_index: 0,
                    content: content.clone(),
                    similarity: *score,
                    created_at: Utc::now(),
                    metadata: StdHashMap::new(),
                })
                .collect())
        }

        async fn search_messages(
            &self,
            query: &str,
            _threshold: f32,
            _limit: usize,
        ) -> Result<Vec<MessageHit>> {
            self.calls
                .lock()
                .unwrap()
                .push(("messages".to_string(), query.to_string()));
            if self.fail_messages {
                return Err(ChatRagError::Retrieval("messages down".to_string()));
            }
            Ok(self
                .messages
                .iter()
                .enumerate()
                .map(|(idx, (content, score))| MessageHit {
                    message_id: format!("msg-{idx}"),
                    conversation_id: None,
                    role: "user".to_string(),
                    content: content.clone(),
                    similarity: *score,
                    created_at: Utc::now(),
                })
                .collect())
        }
    }

    fn pool(search: Arc<RecordingSearch>) -> Arc<SourcePool> {
        Arc::new(SourcePool::new(search, Duration::from_secs(1)))
    }

    fn input<'a>(query: &'a str, history: &'a [ConversationTurn]) -> StrategyInput<'a> {
        StrategyInput {
            query,
            threshold: 0.7,
            limit: 10,
            history,
        }
    }

    #[tokio::test]
    async fn test_semantic_merges_both_sources() {
        let search = Arc::new(
            RecordingSearch::new()
                .with_knowledge("from the knowledge base", 0.9)
                .with_message("from the conversation", 0.8),
        );
        let strategy = SemanticStrategy::new(pool(search.clone()));

        let retrieved = strategy.retrieve(input("test query", &[])).await.unwrap();

        assert_eq!(retrieved.hits.len(), 2);
        assert_eq!(retrieved.sources_queried, vec!["knowledge_base", "conversation"]);
        // Sorted by similarity descending
        assert!(retrieved.hits[0].similarity_score >= retrieved.hits[1].similarity_score);
    }

    #[tokio::test]
    async fn test_semantic_partial_failure_degrades() {
        let mut search = RecordingSearch::new().with_message("still here", 0.8);
        search.fail_knowledge = true;
        let strategy = SemanticStrategy::new(pool(Arc::new(search)));

        let retrieved = strategy.retrieve(input("test query", &[])).await.unwrap();

        assert_eq!(retrieved.hits.len(), 1);
        assert_eq!(retrieved.sources_queried, vec!["conversation"]);
    }

    #[tokio::test]
    async fn test_semantic_total_failure_errors() {
        let mut search = RecordingSearch::new();
        search.fail_knowledge = true;
        search.fail_messages = true;
        let strategy = SemanticStrategy::new(pool(Arc::new(search)));

        let result = strategy.retrieve(input("test query", &[])).await;
        assert!(matches!(result, Err(ChatRagError::Retrieval(_))));
    }

    #[tokio::test]
    async fn test_keyword_queries_knowledge_only() {
        let search = Arc::new(RecordingSearch::new().with_knowledge("pip install docs", 0.9));
        let strategy = KeywordStrategy::new(pool(search.clone()), QueryAnalyzer::new());

        let retrieved = strategy
            .retrieve(input("how to install the package with pip", &[]))
            .await
            .unwrap();

        assert_eq!(retrieved.sources_queried, vec!["knowledge_base"]);
        let calls = search.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "knowledge");
        // Stop-words stripped from the effective query
        assert_eq!(calls[0].1, "install package pip");
    }

    #[tokio::test]
    async fn test_hybrid_dedups_identical_content() {
        // Both sub-strategies hit the same knowledge collection, so the
        // duplicate arrives twice.
        let search = Arc::new(RecordingSearch::new().with_knowledge("Install the package via pip", 0.8));
        let strategy = HybridStrategy::new(pool(search), QueryAnalyzer::new());

        let retrieved = strategy
            .retrieve(input("install the package", &[]))
            .await
            .unwrap();

        let matching = retrieved
            .hits
            .iter()
            .filter(|h| h.content == "Install the package via pip")
            .count();
        assert_eq!(matching, 1);
    }

    #[tokio::test]
    async fn test_contextual_augments_from_history() {
        let search = Arc::new(RecordingSearch::new().with_knowledge("doc", 0.9));
        let strategy = ContextualStrategy::new(pool(search.clone()), QueryAnalyzer::new(), 3);

        let history = vec![
            ConversationTurn::new("user", "we were discussing kubernetes deployment"),
            ConversationTurn::new("assistant", "the rollout uses helm charts"),
        ];
        strategy
            .retrieve(input("show me the config", &history))
            .await
            .unwrap();

        let calls = search.calls();
        let query = &calls[0].1;
        assert!(query.starts_with("show me the config"));
        assert!(query.contains("kubernetes"));
        assert!(query.contains("helm"));
    }

    #[tokio::test]
    async fn test_adaptive_routing() {
        let search = Arc::new(RecordingSearch::new());
        let strategy = AdaptiveStrategy::new(pool(search), QueryAnalyzer::new(), 3);

        assert_eq!(
            strategy.route("explain the API function signature"),
            RetrievalStrategy::Semantic
        );
        assert_eq!(
            strategy.route("could you please help me"),
            RetrievalStrategy::Contextual
        );
        assert_eq!(
            strategy.route("discuss JWT OAuth2 authentication implementation"),
            RetrievalStrategy::Hybrid
        );
    }

    #[test]
    fn test_strategy_set_covers_every_variant() {
        let search = Arc::new(RecordingSearch::new());
        let set = StrategySet::new(pool(search), 3);

        for strategy in RetrievalStrategy::ALL {
            assert!(set.get(strategy).is_some(), "missing {strategy:?}");
        }
    }
}
