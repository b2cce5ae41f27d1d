pub mod candidate;
pub mod chart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod match_store;
pub mod scorer;
pub mod selector;
pub mod similarity;
pub mod text;
pub mod youtube;

pub use candidate::{build_candidates, parse_iso8601_duration, Candidate, Reason, ScoredCandidate};
pub use chart::{load_chart, ChartEntry};
pub use config::Config;
pub use error::{Error, Result, UpstreamError};
pub use fetch::{FetchController, FetchOutcome, LookupOutcome, QuotaState};
pub use match_store::MatchStore;
pub use scorer::{score_candidate, ScoreWeights, WEIGHTS};
pub use selector::{is_improvement, rank_candidates, score_and_select, select_best_video, BestMatch, StoredMatch};
pub use similarity::{SimilarityKind, TextSimilarity, TokenOverlapSimilarity};
pub use youtube::{VideoSearch, YouTubeClient};

#[cfg(feature = "fuzzy")]
pub use similarity::FuzzySimilarity;

/// Set up `env_logger` for the driver binaries (`RUST_LOG` overrides `info`).
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
