use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Timeout applied to each individual source call
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
    /// Backoff before the single internal retry after total source failure
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Per-source fetch limit is `max_results * fetch_multiplier`
    #[serde(default = "default_fetch_multiplier")]
    pub fetch_multiplier: usize,
    /// How many prior turns the contextual strategy draws terms from
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_source_timeout_ms() -> u64 {
    2000
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_fetch_multiplier() -> usize {
    3
}

fn default_history_window() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: default_source_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            fetch_multiplier: default_fetch_multiplier(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached responses, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Weights combined into the final ranking score.
///
/// `similarity` and `relevance` always apply; `freshness` and `authority`
/// are layered on only when the ranking method selects them. The diversity
/// penalty factors apply at selection time, not in the score itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,
    #[serde(default = "default_relevance_weight")]
    pub relevance_weight: f32,
    #[serde(default = "default_freshness_weight")]
    pub freshness_weight: f32,
    #[serde(default = "default_authority_weight")]
    pub authority_weight: f32,
    /// Score discount factor for near-duplicate candidates
    #[serde(default = "default_diversity_penalty")]
    pub diversity_penalty: f32,
    /// Stronger discount used by the diversity ranking method
    #[serde(default = "default_strong_diversity_penalty")]
    pub strong_diversity_penalty: f32,
    /// Content similarity above which the penalty kicks in
    #[serde(default = "default_duplication_threshold")]
    pub duplication_threshold: f32,
}

fn default_similarity_weight() -> f32 {
    0.6
}

fn default_relevance_weight() -> f32 {
    0.4
}

fn default_freshness_weight() -> f32 {
    0.2
}

fn default_authority_weight() -> f32 {
    0.2
}

fn default_diversity_penalty() -> f32 {
    0.3
}

fn default_strong_diversity_penalty() -> f32 {
    0.5
}

fn default_duplication_threshold() -> f32 {
    0.8
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            similarity_weight: default_similarity_weight(),
            relevance_weight: default_relevance_weight(),
            freshness_weight: default_freshness_weight(),
            authority_weight: default_authority_weight(),
            diversity_penalty: default_diversity_penalty(),
            strong_diversity_penalty: default_strong_diversity_penalty(),
            duplication_threshold: default_duplication_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default config file path
    pub fn load() -> crate::Result<Self> {
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.retrieval.source_timeout_ms, 2000);
        assert_eq!(config.ranking.similarity_weight, 0.6);
        assert_eq!(config.ranking.relevance_weight, 0.4);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [cache]
            ttl_secs = 60

            [retrieval]
            source_timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.retrieval.source_timeout_ms, 500);
        assert_eq!(config.retrieval.fetch_multiplier, 3);
        assert_eq!(config.ranking.duplication_threshold, 0.8);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\nbacktrace = true").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.backtrace);
    }
}
