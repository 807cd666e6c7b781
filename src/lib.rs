pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod rag;
pub mod sources;

pub use config::AppConfig;
pub use errors::*;
pub use models::ConversationTurn;
pub use models::RagConfig;
pub use models::RagMetrics;
pub use models::RagRequest;
pub use models::RagResponse;
pub use models::RagResult;
pub use models::RankingMethod;
pub use models::RawHit;
pub use models::RetrievalStrategy;
pub use models::SourceKind;
pub use models::SourceType;
pub use rag::RagEngine;
pub use rag::RagService;
