//! Ranking of scored candidates and selection of the best match.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::candidate::{Candidate, ScoredCandidate};
use crate::scorer::score_candidate;
use crate::similarity::TextSimilarity;

/// The winning video for a song, as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    /// Winning score, persisted as the match confidence
    pub score: f64,
    pub reasons: Vec<String>,
}

impl From<ScoredCandidate> for BestMatch {
    fn from(scored: ScoredCandidate) -> Self {
        let reasons = scored.reason_strings();
        BestMatch {
            video_id: scored.candidate.video_id,
            title: scored.candidate.title,
            channel_title: scored.candidate.channel_title,
            score: scored.score,
            reasons,
        }
    }
}

/// A previously stored match for a song.  An empty `video_id` records a
/// lookup that found nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredMatch {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub confidence_score: f64,
}

impl StoredMatch {
    pub fn is_empty(&self) -> bool {
        self.video_id.is_empty()
    }
}

impl From<&BestMatch> for StoredMatch {
    fn from(best: &BestMatch) -> Self {
        StoredMatch {
            video_id: best.video_id.clone(),
            title: best.title.clone(),
            channel_title: best.channel_title.clone(),
            confidence_score: best.score,
        }
    }
}

impl From<&ScoredCandidate> for StoredMatch {
    fn from(scored: &ScoredCandidate) -> Self {
        StoredMatch {
            video_id: scored.candidate.video_id.clone(),
            title: scored.candidate.title.clone(),
            channel_title: scored.candidate.channel_title.clone(),
            confidence_score: scored.score,
        }
    }
}

/// Descending by score, then by view count.
fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.candidate.view_count.cmp(&a.candidate.view_count))
}

/// Score every candidate and return them best first.
/// Candidates that tie on both score and views keep their input order.
pub fn rank_candidates(
    artist: &str,
    song: &str,
    candidates: Vec<Candidate>,
    similarity: Option<&dyn TextSimilarity>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|c| score_candidate(c, artist, song, similarity))
        .collect();
    scored.sort_by(rank_order);
    scored
}

/// The highest ranked candidate, or `None` for an empty list.
pub fn select_best_video(
    candidates: Vec<Candidate>,
    artist: &str,
    song: &str,
    similarity: Option<&dyn TextSimilarity>,
) -> Option<ScoredCandidate> {
    rank_candidates(artist, song, candidates, similarity).into_iter().next()
}

/// Score, rank and return the winner as a [`BestMatch`].
pub fn score_and_select(
    artist: &str,
    song: &str,
    candidates: Vec<Candidate>,
    similarity: Option<&dyn TextSimilarity>,
) -> Option<BestMatch> {
    select_best_video(candidates, artist, song, similarity).map(BestMatch::from)
}

/// Whether `best` should replace the `current` stored match.
///
/// The best candidate must be a different video, and it must either beat the
/// stored confidence by more than `min_delta` or replace an empty match.
pub fn is_improvement(current: Option<&StoredMatch>, best: &ScoredCandidate, min_delta: f64) -> bool {
    let best_id = best.candidate.video_id.as_str();
    if best_id.is_empty() {
        return false;
    }
    match current {
        None => true,
        Some(current) if current.is_empty() => true,
        Some(current) => {
            best_id != current.video_id && best.score - current.confidence_score > min_delta
        }
    }
}
