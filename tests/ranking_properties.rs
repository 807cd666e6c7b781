use std::collections::HashMap;

use chatrag::config::RankingConfig;
use chatrag::models::RagConfig;
use chatrag::models::RagRequest;
use chatrag::models::RankingMethod;
use chatrag::models::RawHit;
use chatrag::models::RetrievalStrategy;
use chatrag::models::SourceKind;
use chatrag::models::SourceType;
use chatrag::rag::scoring;
use chatrag::rag::ResultRanker;
use chrono::Utc;
use proptest::prelude::*;

fn hit(source_id: &str, content: &str, similarity: f32) -> RawHit {
    RawHit {
        content: content.to_string(),
        source: SourceKind::KnowledgeBase,
        source_type: SourceType::Document,
        source_id: source_id.to_string(),
        similarity_score: similarity,
        chunk_index: 0,
        created_at: Utc::now(),
        metadata: HashMap::new(),
    }
}

proptest! {
    #[test]
    fn relevance_is_bounded(query in ".{0,80}", content in ".{0,200}") {
        let score = scoring::relevance_score(&query, &content);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn content_similarity_is_bounded_and_symmetric(a in ".{0,120}", b in ".{0,120}") {
        let ab = scoring::content_similarity(&a, &b);
        let ba = scoring::content_similarity(&b, &a);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn ranking_is_monotone_in_similarity_and_relevance(
        sim_low in 0.0f32..0.5,
        sim_gap in 0.01f32..0.5,
    ) {
        // A beats B on similarity and on relevance (full vs zero overlap)
        let query = "install the package";
        let candidates = vec![
            hit("b", "unrelated words entirely", sim_low),
            hit("a", "install the package", sim_low + sim_gap),
        ];

        let ranker = ResultRanker::new(RankingConfig::default());
        let results = ranker.rank(candidates, query, RankingMethod::Relevance, 10, 100_000);

        prop_assert_eq!(results.len(), 2);
        prop_assert_eq!(results[0].source_id.as_str(), "a");
        prop_assert!(results[0].ranking_score >= results[1].ranking_score);
    }

    #[test]
    fn selection_never_exceeds_budget_or_max_results(
        contents in prop::collection::vec("[a-z ]{10,200}", 1..20),
        max_results in 1usize..10,
        budget in 10usize..500,
    ) {
        let candidates = contents
            .iter()
            .enumerate()
            .map(|(idx, content)| hit(&format!("doc-{idx}"), content, 0.5))
            .collect();

        let ranker = ResultRanker::new(RankingConfig::default());
        let results = ranker.rank(candidates, "query", RankingMethod::Relevance, max_results, budget);

        let token_sum: usize = results.iter().map(|r| r.token_count).sum();
        prop_assert!(token_sum <= budget);
        prop_assert!(results.len() <= max_results);
    }

    #[test]
    fn short_queries_fail_validation(padding in "[ \t]{0,5}", core in ".{0,2}") {
        // Anything under 3 characters after trimming is rejected
        let query = format!("{padding}{core}{padding}");
        prop_assume!(query.trim().chars().count() < 3);

        let config = RagConfig::new("default", RetrievalStrategy::Semantic);
        let request = RagRequest::new(&query);
        prop_assert!(request.validate_against(&config).is_err());
    }

    #[test]
    fn queries_of_three_chars_pass_validation(core in "[a-zA-Z0-9]{3,40}") {
        let config = RagConfig::new("default", RetrievalStrategy::Semantic);
        let request = RagRequest::new(&core);
        prop_assert!(request.validate_against(&config).is_ok());
    }
}
