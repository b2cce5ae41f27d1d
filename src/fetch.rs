//! Quota-aware search → details → score → select pipeline.
//!
//! The [`FetchController`] owns an ordered pool of API keys and a cursor into
//! it ([`QuotaState`]).  When the platform rejects a call for quota the
//! cursor moves to the next key and the same query is retried; once every key
//! has been rejected the controller is exhausted for the rest of its life and
//! all further lookups return "no result" without touching the network.  Any
//! other upstream failure ends that one lookup without moving the cursor.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::candidate::{build_candidates, Candidate, ScoredCandidate};
use crate::config::Config;
use crate::error::{Error, Result, UpstreamError};
use crate::selector::{rank_candidates, BestMatch};
use crate::similarity::TextSimilarity;
use crate::youtube::{VideoSearch, YouTubeClient, MAX_PAGE_SIZE};

/// Ordered API keys plus the index of the key in use.
/// The index only ever moves forward.
#[derive(Debug, Clone)]
pub struct QuotaState {
    keys: Vec<String>,
    index: usize,
}

impl QuotaState {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::NoCredentials);
        }
        Ok(QuotaState { keys, index: 0 })
    }

    /// Index and value of the key in use, `None` once exhausted.
    pub fn current(&self) -> Option<(usize, &str)> {
        self.keys.get(self.index).map(|k| (self.index, k.as_str()))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.keys.len()
    }

    /// Move past the key at `index` after it was rejected for quota.
    /// A no-op if another caller already moved past it.
    pub fn advance_from(&mut self, index: usize) {
        if self.index == index && !self.is_exhausted() {
            self.index += 1;
        }
    }
}

/// How one lookup ended.
#[derive(Debug)]
pub enum FetchOutcome {
    Candidates(Vec<Candidate>),
    /// The search returned no usable hits.
    NoCandidates,
    /// Every configured key has been rejected for quota.
    QuotaExhausted,
    /// A non-quota upstream failure.
    Failed(UpstreamError),
}

/// Result of a full lookup for one song, for per-song batch logging.
#[derive(Debug)]
pub enum LookupOutcome {
    Matched(BestMatch),
    NoCandidates,
    QuotaExhausted,
    Failed(UpstreamError),
}

impl LookupOutcome {
    pub fn into_match(self) -> Option<BestMatch> {
        match self {
            LookupOutcome::Matched(best) => Some(best),
            _ => None,
        }
    }
}

pub struct FetchController<S> {
    search: S,
    quota: Mutex<QuotaState>,
    max_results: u32,
    similarity: Option<Box<dyn TextSimilarity>>,
}

impl FetchController<YouTubeClient> {
    /// Controller talking to the real API, set up from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let controller = FetchController::new(YouTubeClient::from_config(config), config.resolve_api_keys())?
            .with_max_results(config.max_results())
            .with_similarity(config.similarity().build());
        Ok(controller)
    }
}

impl<S: VideoSearch> FetchController<S> {
    /// Fails with [`Error::NoCredentials`] when `api_keys` is empty.
    pub fn new(search: S, api_keys: Vec<String>) -> Result<Self> {
        Ok(FetchController {
            search,
            quota: Mutex::new(QuotaState::new(api_keys)?),
            max_results: crate::config::DEFAULT_MAX_RESULTS,
            similarity: crate::similarity::SimilarityKind::default().build(),
        })
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_similarity(mut self, similarity: Option<Box<dyn TextSimilarity>>) -> Self {
        self.similarity = similarity;
        self
    }

    fn quota(&self) -> MutexGuard<'_, QuotaState> {
        self.quota.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the rotation state.
    pub fn quota_state(&self) -> QuotaState {
        self.quota().clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.quota().is_exhausted()
    }

    /// Run search + details for `"{song} {artist}"`, rotating keys on quota
    /// rejection.  Makes at most one attempt per remaining key.
    pub fn fetch_candidates(&self, artist: &str, song: &str, limit: u32) -> FetchOutcome {
        let query = format!("{} {}", song, artist).trim().to_string();
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        loop {
            let (index, key) = match self.quota().current() {
                Some((index, key)) => (index, key.to_string()),
                None => {
                    log::warn!("All API keys exhausted, skipping search for {:?}", query);
                    return FetchOutcome::QuotaExhausted;
                }
            };

            log::info!("Searching YouTube for candidates: {:?}", query);
            match self.run_query(&query, limit, &key) {
                Ok(candidates) if candidates.is_empty() => {
                    log::info!("No search results for query: {:?}", query);
                    return FetchOutcome::NoCandidates;
                }
                Ok(candidates) => return FetchOutcome::Candidates(candidates),
                Err(err) if err.is_quota() => {
                    let mut quota = self.quota();
                    quota.advance_from(index);
                    if quota.is_exhausted() {
                        log::warn!("All API keys exhausted (quota) while searching for {:?}", query);
                        return FetchOutcome::QuotaExhausted;
                    }
                    log::info!("Quota exceeded. Switching to API key {}/{}", quota.index() + 1, quota.len());
                }
                Err(err) => {
                    log::error!("YouTube API error for {:?}: {}", query, err);
                    return FetchOutcome::Failed(err);
                }
            }
        }
    }

    fn run_query(&self, query: &str, limit: u32, api_key: &str) -> Result<Vec<Candidate>, UpstreamError> {
        let hits = self.search.search(query, limit, api_key)?;
        let ids: Vec<String> = hits
            .iter()
            .filter_map(|h| h.id.video_id.clone())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let details = self.search.video_details(&ids, api_key)?;
        Ok(build_candidates(&hits, &details))
    }

    /// Full pipeline for one song, reporting why nothing was found.
    pub fn lookup(&self, artist: &str, song: &str) -> LookupOutcome {
        let candidates = match self.fetch_candidates(artist, song, self.max_results) {
            FetchOutcome::Candidates(c) => c,
            FetchOutcome::NoCandidates => return LookupOutcome::NoCandidates,
            FetchOutcome::QuotaExhausted => return LookupOutcome::QuotaExhausted,
            FetchOutcome::Failed(err) => return LookupOutcome::Failed(err),
        };

        let ranked = rank_candidates(artist, song, candidates, self.similarity.as_deref());
        for scored in &ranked {
            log::debug!("  {:.2} {} {:?} reasons={:?}",
                        scored.score, scored.candidate.video_id, scored.candidate.title, scored.reason_strings());
        }

        match ranked.into_iter().next() {
            Some(best) => {
                let best = BestMatch::from(best);
                log::info!("Selected video {} score={:.2} title={:?} channel={:?} reasons={:?}",
                           best.video_id, best.score, best.title, best.channel_title, best.reasons);
                LookupOutcome::Matched(best)
            }
            None => LookupOutcome::NoCandidates,
        }
    }

    /// Best match for a song, or `None` when nothing could be found.
    pub fn fetch_and_select(&self, artist: &str, song: &str) -> Option<BestMatch> {
        self.lookup(artist, song).into_match()
    }

    /// Every candidate for a song, scored and best first.  Empty when the
    /// lookup failed or found nothing.
    pub fn fetch_ranked(&self, artist: &str, song: &str, limit: u32) -> Vec<ScoredCandidate> {
        match self.fetch_candidates(artist, song, limit) {
            FetchOutcome::Candidates(c) => self.rank(artist, song, c),
            _ => Vec::new(),
        }
    }

    /// Score already fetched candidates with this controller's similarity.
    pub fn rank(&self, artist: &str, song: &str, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        rank_candidates(artist, song, candidates, self.similarity.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{SearchHit, SearchHitId, Snippet, Statistics, VideoDetails};

    /// Platform double: keys listed in `quota_keys` are rejected for quota,
    /// keys in `broken_keys` fail with a server error.
    struct MockSearch {
        quota_keys: Vec<&'static str>,
        broken_keys: Vec<&'static str>,
        videos: Vec<(&'static str, &'static str, &'static str)>,
        search_calls: Mutex<Vec<String>>,
        search_limits: Mutex<Vec<u32>>,
        detail_calls: Mutex<Vec<String>>,
    }

    impl MockSearch {
        fn new(videos: Vec<(&'static str, &'static str, &'static str)>) -> Self {
            MockSearch {
                quota_keys: Vec::new(),
                broken_keys: Vec::new(),
                videos,
                search_calls: Mutex::new(Vec::new()),
                search_limits: Mutex::new(Vec::new()),
                detail_calls: Mutex::new(Vec::new()),
            }
        }

        fn check_key(&self, api_key: &str) -> Result<(), UpstreamError> {
            if self.quota_keys.iter().any(|k| *k == api_key) {
                return Err(UpstreamError::Quota { status: 403 });
            }
            if self.broken_keys.iter().any(|k| *k == api_key) {
                return Err(UpstreamError::Status { status: 500, message: "backend error".into() });
            }
            Ok(())
        }
    }

    impl VideoSearch for MockSearch {
        fn search(&self, _query: &str, max_results: u32, api_key: &str) -> Result<Vec<SearchHit>, UpstreamError> {
            self.search_calls.lock().unwrap().push(api_key.to_string());
            self.search_limits.lock().unwrap().push(max_results);
            self.check_key(api_key)?;
            Ok(self
                .videos
                .iter()
                .take(max_results as usize)
                .map(|(id, title, _)| SearchHit {
                    id: SearchHitId { video_id: Some(id.to_string()) },
                    snippet: Some(Snippet { title: Some(title.to_string()), ..Default::default() }),
                })
                .collect())
        }

        fn video_details(&self, video_ids: &[String], api_key: &str) -> Result<Vec<VideoDetails>, UpstreamError> {
            self.detail_calls.lock().unwrap().push(api_key.to_string());
            self.check_key(api_key)?;
            Ok(self
                .videos
                .iter()
                .filter(|(id, _, _)| video_ids.iter().any(|v| v.as_str() == *id))
                .map(|(id, title, channel)| VideoDetails {
                    id: id.to_string(),
                    snippet: Some(Snippet {
                        title: Some(title.to_string()),
                        channel_title: Some(channel.to_string()),
                        category_id: Some("10".to_string()),
                        published_at: None,
                    }),
                    statistics: Some(Statistics { view_count: Some("1000".to_string()) }),
                    content_details: None,
                })
                .collect())
        }
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|k| k.to_string()).collect()
    }

    fn cardigan_videos() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("lyric1", "Taylor Swift - Cardigan (Lyric Video)", "Lyrics Hub"),
            ("off1", "Taylor Swift - cardigan (Official Music Video)", "Taylor Swift"),
            ("aud1", "Taylor Swift - Cardigan (Official Audio)", "Taylor Swift - Topic"),
        ]
    }

    #[test]
    fn test_no_keys_is_configuration_error() {
        let result = FetchController::new(MockSearch::new(Vec::new()), Vec::new());
        assert!(matches!(result, Err(Error::NoCredentials)));
    }

    #[test]
    fn test_fetch_and_select_end_to_end() {
        let controller = FetchController::new(MockSearch::new(cardigan_videos()), keys(&["k1"])).unwrap();
        let best = controller.fetch_and_select("Taylor Swift", "Cardigan").unwrap();
        assert_eq!(best.video_id, "off1");
        assert_eq!(best.channel_title, "Taylor Swift");
        assert!(best.reasons.iter().any(|r| r.starts_with("artist_channel_exact")));
    }

    #[test]
    fn test_fetch_ranked_returns_full_sorted_list() {
        let controller = FetchController::new(MockSearch::new(cardigan_videos()), keys(&["k1"])).unwrap();
        let ranked = controller.fetch_ranked("Taylor Swift", "Cardigan", 15);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].candidate.video_id, "off1");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_all_keys_rejected_returns_no_result() {
        let mut search = MockSearch::new(cardigan_videos());
        search.quota_keys = vec!["k1", "k2", "k3"];
        let controller = FetchController::new(search, keys(&["k1", "k2", "k3"])).unwrap();

        assert!(matches!(controller.lookup("Taylor Swift", "Cardigan"), LookupOutcome::QuotaExhausted));
        assert_eq!(*controller.search.search_calls.lock().unwrap(), keys(&["k1", "k2", "k3"]));
        assert!(controller.is_exhausted());

        // Exhaustion is terminal: no further calls are attempted
        assert!(controller.fetch_and_select("Taylor Swift", "Cardigan").is_none());
        assert_eq!(controller.search.search_calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_rotation_is_sticky_across_queries() {
        let mut search = MockSearch::new(cardigan_videos());
        search.quota_keys = vec!["k1"];
        let controller = FetchController::new(search, keys(&["k1", "k2"])).unwrap();

        assert!(controller.fetch_and_select("Taylor Swift", "Cardigan").is_some());
        assert_eq!(controller.quota_state().index(), 1);

        assert!(controller.fetch_and_select("Taylor Swift", "Willow").is_some());
        assert_eq!(*controller.search.search_calls.lock().unwrap(), keys(&["k1", "k2", "k2"]));
    }

    #[test]
    fn test_quota_on_details_call_also_rotates() {
        struct DetailsQuota(MockSearch);
        impl VideoSearch for DetailsQuota {
            fn search(&self, q: &str, n: u32, key: &str) -> Result<Vec<SearchHit>, UpstreamError> {
                self.0.search(q, n, key)
            }
            fn video_details(&self, ids: &[String], key: &str) -> Result<Vec<VideoDetails>, UpstreamError> {
                if key == "k1" {
                    return Err(UpstreamError::Quota { status: 403 });
                }
                self.0.video_details(ids, key)
            }
        }

        let controller = FetchController::new(DetailsQuota(MockSearch::new(cardigan_videos())), keys(&["k1", "k2"]))
            .unwrap();
        let best = controller.fetch_and_select("Taylor Swift", "Cardigan").unwrap();
        assert_eq!(best.video_id, "off1");
        assert_eq!(controller.quota_state().index(), 1);
    }

    #[test]
    fn test_other_errors_do_not_rotate() {
        let mut search = MockSearch::new(cardigan_videos());
        search.broken_keys = vec!["k1"];
        let controller = FetchController::new(search, keys(&["k1", "k2"])).unwrap();

        assert!(matches!(controller.lookup("Taylor Swift", "Cardigan"), LookupOutcome::Failed(_)));
        assert_eq!(controller.quota_state().index(), 0);
        assert_eq!(controller.search.search_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_fetch_is_distinct_from_no_candidates() {
        let mut search = MockSearch::new(cardigan_videos());
        search.broken_keys = vec!["k1"];
        let controller = FetchController::new(search, keys(&["k1"])).unwrap();
        assert!(matches!(
            controller.fetch_candidates("Taylor Swift", "Cardigan", 5),
            FetchOutcome::Failed(UpstreamError::Status { status: 500, .. })
        ));
        assert!(!controller.is_exhausted());
    }

    #[test]
    fn test_rank_uses_controller_similarity() {
        let controller = FetchController::new(MockSearch::new(cardigan_videos()), keys(&["k1"]))
            .unwrap()
            .with_similarity(None);
        let candidates = match controller.fetch_candidates("Taylor Swift", "Cardigan", 15) {
            FetchOutcome::Candidates(c) => c,
            other => panic!("unexpected outcome {:?}", other),
        };
        let ranked = controller.rank("Taylor Swift", "Cardigan", candidates);
        assert_eq!(ranked[0].candidate.video_id, "off1");
        assert!(ranked.iter().all(|s| !s.reasons.iter().any(|r| r.label.starts_with("rf_"))));
    }

    #[test]
    fn test_empty_search_is_no_candidates() {
        let controller = FetchController::new(MockSearch::new(Vec::new()), keys(&["k1"])).unwrap();
        assert!(matches!(controller.lookup("Nobody", "Nothing"), LookupOutcome::NoCandidates));
        assert!(controller.fetch_ranked("Nobody", "Nothing", 10).is_empty());
        // No ids, so no details call
        assert!(controller.search.detail_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_max_results_is_passed_to_search() {
        let controller = FetchController::new(MockSearch::new(cardigan_videos()), keys(&["k1"]))
            .unwrap()
            .with_max_results(2);
        // Only the first two hits (lyric1, off1) come back
        let best = controller.fetch_and_select("Taylor Swift", "Cardigan").unwrap();
        assert_eq!(best.video_id, "off1");
        assert_eq!(*controller.search.search_limits.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_max_results_defaults_and_clamps() {
        let controller = FetchController::new(MockSearch::new(cardigan_videos()), keys(&["k1"])).unwrap();
        assert!(matches!(controller.lookup("Taylor Swift", "Cardigan"), LookupOutcome::Matched(_)));

        let controller = controller.with_max_results(500);
        assert!(matches!(controller.lookup("Taylor Swift", "Cardigan"), LookupOutcome::Matched(_)));
        assert_eq!(*controller.search.search_limits.lock().unwrap(), vec![15, 50]);
    }

    #[test]
    fn test_quota_state_advance_is_guarded() {
        let mut state = QuotaState::new(keys(&["a", "b"])).unwrap();
        state.advance_from(0);
        state.advance_from(0);
        assert_eq!(state.index(), 1);
        assert_eq!(state.current(), Some((1, "b")));
        state.advance_from(1);
        assert!(state.is_exhausted());
        assert_eq!(state.current(), None);
        state.advance_from(2);
        assert_eq!(state.index(), 2);
    }
}
