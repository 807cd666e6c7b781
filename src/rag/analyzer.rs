//! Query analysis: classification and keyword extraction

/// Classification used by the adaptive strategy to pick a retrieval path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Mentions domain vocabulary (api, function, class, database, ...)
    Technical,
    /// Polite or phrasal forms ("could you...", "please...")
    Conversational,
    /// Neither: highly specific wording that benefits from hybrid search
    Specific,
}

/// Words too common to carry retrieval signal
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "did", "its", "let", "she", "too", "use", "that", "with", "have", "this",
    "will", "your", "from", "they", "know", "want", "been", "good", "much", "some", "time", "what",
    "when", "where", "which", "about", "into", "than", "them", "then", "there", "these", "would",
    "could", "should", "please",
];

/// Domain vocabulary marking a query as technical
const TECHNICAL_TERMS: &[&str] = &[
    "api", "function", "class", "database", "method", "endpoint", "schema", "module", "library",
    "compiler", "sdk",
];

/// Phrasal markers of a conversational query
const CONVERSATIONAL_MARKERS: &[&str] = &[
    "please",
    "could you",
    "can you",
    "would you",
    "help me",
    "how can",
    "how do",
    "what do you think",
    "thanks",
    "thank you",
];

/// Stateless query analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAnalyzer;

impl QueryAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify a query for adaptive routing.
    ///
    /// Technical vocabulary wins over conversational markers when both
    /// are present.
    #[must_use]
    pub fn classify(&self, query: &str) -> QueryKind {
        let lowered = query.to_lowercase();

        let technical = lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| TECHNICAL_TERMS.contains(&token));
        if technical {
            return QueryKind::Technical;
        }

        let conversational = CONVERSATIONAL_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker));
        if conversational {
            return QueryKind::Conversational;
        }

        QueryKind::Specific
    }

    /// Extract search keywords from a query.
    ///
    /// Keeps lowercased tokens of length >= 3 that are not stop-words,
    /// plus acronyms of length >= 2 regardless of stop-word status.
    /// Order-preserving, deduplicated.
    #[must_use]
    pub fn extract_keywords(&self, query: &str) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();

        for token in query.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }

            let is_acronym = token.len() >= 2
                && token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
                && token.chars().any(|c| c.is_ascii_uppercase());
            let lowered = token.to_lowercase();

            let keep = is_acronym || (lowered.len() >= 3 && !STOP_WORDS.contains(&lowered.as_str()));
            if keep && !keywords.contains(&lowered) {
                keywords.push(lowered);
            }
        }

        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_technical() {
        let analyzer = QueryAnalyzer::new();
        assert_eq!(
            analyzer.classify("explain the API function signature"),
            QueryKind::Technical
        );
        assert_eq!(
            analyzer.classify("what is the database schema"),
            QueryKind::Technical
        );
    }

    #[test]
    fn test_classify_conversational() {
        let analyzer = QueryAnalyzer::new();
        assert_eq!(
            analyzer.classify("could you please help me"),
            QueryKind::Conversational
        );
        assert_eq!(
            analyzer.classify("how can I reset my password"),
            QueryKind::Conversational
        );
    }

    #[test]
    fn test_classify_specific() {
        let analyzer = QueryAnalyzer::new();
        assert_eq!(
            analyzer.classify("discuss JWT OAuth2 authentication implementation"),
            QueryKind::Specific
        );
    }

    #[test]
    fn test_technical_beats_conversational() {
        let analyzer = QueryAnalyzer::new();
        assert_eq!(
            analyzer.classify("could you please explain this api"),
            QueryKind::Technical
        );
    }

    #[test]
    fn test_extract_keywords_drops_stop_words() {
        let analyzer = QueryAnalyzer::new();
        let keywords = analyzer.extract_keywords("how to install the package with pip");
        assert_eq!(keywords, vec!["install", "package", "pip"]);
    }

    #[test]
    fn test_extract_keywords_keeps_acronyms() {
        let analyzer = QueryAnalyzer::new();
        let keywords = analyzer.extract_keywords("configure JWT and TLS for the API");
        assert_eq!(keywords, vec!["configure", "jwt", "tls", "api"]);
    }

    #[test]
    fn test_extract_keywords_dedupes() {
        let analyzer = QueryAnalyzer::new();
        let keywords = analyzer.extract_keywords("cache cache CACHE invalidation");
        assert_eq!(keywords, vec!["cache", "invalidation"]);
    }
}
