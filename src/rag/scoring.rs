//! Pure score functions used by the ranker
//!
//! Nothing in this module suspends or fails: hits missing optional
//! metadata fall back to the unknown tier instead of aborting a ranking
//! pass.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;

use crate::models::SourceKind;
use crate::models::SourceType;

/// Freshness decay horizon in days
const FRESHNESS_HALF_LIFE_DAYS: f32 = 365.0;

/// Floor below which freshness never decays
const FRESHNESS_FLOOR: f32 = 0.1;

/// Authority assigned when neither metadata nor source kind gives a tier
const UNKNOWN_AUTHORITY: f32 = 0.3;

fn token_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Token-overlap ratio between query terms and candidate content, in [0, 1]
#[must_use]
pub fn relevance_score(query: &str, content: &str) -> f32 {
    let query_tokens = token_set(query);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let content_tokens = token_set(content);
    let matched = query_tokens
        .iter()
        .filter(|t| content_tokens.contains(*t))
        .count();

    (matched as f32 / query_tokens.len() as f32).clamp(0.0, 1.0)
}

/// Exponential-decay freshness: ~1 for recent content, floored at 0.1
/// for multi-year-old content. Future timestamps score 1.
#[must_use]
pub fn freshness_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_secs = (now - created_at).num_seconds();
    if age_secs <= 0 {
        return 1.0;
    }

    let age_days = age_secs as f32 / 86_400.0;
    (-age_days / FRESHNESS_HALF_LIFE_DAYS).exp().max(FRESHNESS_FLOOR)
}

/// Source-authority tier lookup.
///
/// An explicit `source_tier` metadata entry wins; otherwise the tier is
/// derived from the source kind, and anything unrecognized lands on the
/// unknown tier.
#[must_use]
pub fn authority_score(
    source: SourceKind,
    source_type: SourceType,
    metadata: &HashMap<String, serde_json::Value>,
) -> f32 {
    if let Some(tier) = metadata.get("source_tier").and_then(|v| v.as_str()) {
        return match tier {
            "official_documentation" => 1.0,
            "verified" => 0.8,
            "community" => 0.5,
            _ => UNKNOWN_AUTHORITY,
        };
    }

    match (source, source_type) {
        (SourceKind::KnowledgeBase, SourceType::Document) => 0.7,
        (SourceKind::Conversation, SourceType::Message) => 0.5,
        _ => UNKNOWN_AUTHORITY,
    }
}

/// Symmetric Jaccard similarity over normalized word tokens, in [0, 1]
#[must_use]
pub fn content_similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }

    let tokens_a = token_set(a);
    let tokens_b = token_set(b);
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    intersection as f32 / union as f32
}

/// Maximum content similarity of a candidate against already-accepted
/// results, in [0, 1]
#[must_use]
pub fn diversity_penalty<'a, I>(content: &str, accepted: I) -> f32
where
    I: IntoIterator<Item = &'a str>,
{
    accepted
        .into_iter()
        .map(|selected| content_similarity(content, selected))
        .fold(0.0, f32::max)
}

/// Approximate token count (4 characters per token)
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
