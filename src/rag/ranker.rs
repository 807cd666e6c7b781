//! Result ranking: scoring, diversity-penalized selection, budget packing

use chrono::DateTime;
use chrono::Utc;
use tracing::debug;

use crate::config::RankingConfig;
use crate::models::RagResult;
use crate::models::RankingMethod;
use crate::models::RawHit;
use crate::rag::scoring;

/// Candidate carrying its computed scores through selection
#[derive(Debug, Clone)]
struct Scored {
    hit: RawHit,
    relevance: f32,
    score: f32,
    penalized: bool,
}

/// Ranks a merged candidate pool into the final, budgeted result list
pub struct ResultRanker {
    weights: RankingConfig,
}

impl ResultRanker {
    #[must_use]
    pub fn new(weights: RankingConfig) -> Self {
        Self { weights }
    }

    /// Score, select and truncate candidates.
    ///
    /// Selection is greedy by effective score. A candidate whose content
    /// is close to an already-selected result is discounted once and
    /// re-queued instead of rejected; admission is whole-result only, and
    /// stops at the first candidate that would overrun the token budget.
    #[must_use]
    pub fn rank(
        &self,
        candidates: Vec<RawHit>,
        query: &str,
        ranking_method: RankingMethod,
        max_results: usize,
        max_context_length: usize,
    ) -> Vec<RagResult> {
        let now = Utc::now();
        let mut pool: Vec<Scored> = candidates
            .into_iter()
            .map(|hit| self.score_candidate(hit, query, ranking_method, now))
            .collect();

        pool.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.hit.source_id.cmp(&b.hit.source_id))
        });

        let penalty_factor = if ranking_method == RankingMethod::Diversity {
            self.weights.strong_diversity_penalty
        } else {
            self.weights.diversity_penalty
        };

        let mut selected: Vec<RagResult> = Vec::new();
        let mut token_sum = 0usize;

        while selected.len() < max_results && !pool.is_empty() {
            let mut candidate = pool.remove(0);

            let penalty = scoring::diversity_penalty(
                &candidate.hit.content,
                selected.iter().map(|r| r.content.as_str()),
            );
            if penalty >= self.weights.duplication_threshold && !candidate.penalized {
                candidate.score -= penalty_factor * penalty;
                candidate.penalized = true;
                Self::reinsert(&mut pool, candidate);
                continue;
            }

            let token_count = scoring::estimate_tokens(&candidate.hit.content);
            if token_sum + token_count > max_context_length {
                debug!(
                    "Token budget reached: {} selected, {} tokens",
                    selected.len(),
                    token_sum
                );
                break;
            }
            token_sum += token_count;

            selected.push(RagResult {
                content: candidate.hit.content,
                source: candidate.hit.source,
                source_type: candidate.hit.source_type,
                source_id: candidate.hit.source_id,
                similarity_score: candidate.hit.similarity_score,
                relevance_score: candidate.relevance,
                ranking_score: candidate.score,
                token_count,
            });
        }

        selected
    }

    fn score_candidate(
        &self,
        hit: RawHit,
        query: &str,
        ranking_method: RankingMethod,
        now: DateTime<Utc>,
    ) -> Scored {
        let relevance = scoring::relevance_score(query, &hit.content);

        let mut score = self.weights.similarity_weight * hit.similarity_score
            + self.weights.relevance_weight * relevance;

        match ranking_method {
            RankingMethod::Freshness => {
                score += self.weights.freshness_weight * scoring::freshness_score(hit.created_at, now);
            }
            RankingMethod::Authority => {
                score += self.weights.authority_weight
                    * scoring::authority_score(hit.source, hit.source_type, &hit.metadata);
            }
            RankingMethod::Relevance | RankingMethod::Diversity => {}
        }

        Scored {
            hit,
            relevance,
            score,
            penalized: false,
        }
    }

    /// Put a discounted candidate back, keeping the pool sorted by score
    fn reinsert(pool: &mut Vec<Scored>, candidate: Scored) {
        let position = pool
            .iter()
            .position(|other| other.score < candidate.score)
            .unwrap_or(pool.len());
        pool.insert(position, candidate);
    }
}
