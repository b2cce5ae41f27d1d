//! Candidate construction from YouTube Data API records.
//!
//! A search returns lightweight hits (`search.list`); a second call fetches
//! the richer details (`videos.list`) for the same ids.  Both are merged into
//! one [`Candidate`] per hit.  Missing or malformed fields never abort the
//! build: text falls back to empty strings, views to 0 and duration to
//! "unknown".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchHit>,
}

/// One item of a `search.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: SearchHitId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHitId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snippet {
    pub title: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoDetails>,
}

/// One item of a `videos.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    pub snippet: Option<Snippet>,
    pub statistics: Option<Statistics>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Statistics {
    /// The API sends counts as decimal strings.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDetails {
    pub duration: Option<String>,
}

// ── Candidate ────────────────────────────────────────────────────────────────

/// One prospective video match for a song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub view_count: u64,
    pub duration_seconds: Option<u64>,
    pub category_id: Option<String>,
    pub published_at: Option<String>,
}

/// One applied scoring signal: a label and its signed contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub label: String,
    pub delta: f64,
}

impl Reason {
    pub fn new(label: impl Into<String>, delta: f64) -> Self {
        Reason { label: label.into(), delta }
    }
}

impl fmt::Display for Reason {
    /// `official_keyword:+25.0`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:+.1}", self.label, self.delta)
    }
}

/// A candidate together with its score and the signals that produced it.
/// `score` is always the sum of the `reasons` deltas, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

impl ScoredCandidate {
    /// Reasons rendered as `label:+delta` strings.
    pub fn reason_strings(&self) -> Vec<String> {
        self.reasons.iter().map(Reason::to_string).collect()
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────────────

/// Parse a duration of the form `PT[nH][nM][nS]` into seconds.
///
/// Components are optional but must appear in that order, at most once, as
/// whole numbers.  Anything else (days, fractions, stray digits) is `None`,
/// meaning "unknown".
pub fn parse_iso8601_duration(s: &str) -> Option<u64> {
    let rest = s.strip_prefix("PT")?;

    let mut total: u64 = 0;
    let mut digits = String::new();
    // Index into "HMS" of the next unit allowed
    let mut next_unit = 0;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (idx, factor) = match c {
            'H' => (0, 3600),
            'M' => (1, 60),
            'S' => (2, 1),
            _ => return None,
        };
        if idx < next_unit || digits.is_empty() {
            return None;
        }
        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(factor)?)?;
        digits.clear();
        next_unit = idx + 1;
    }

    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

/// Parse a decimal view count; absent or non-numeric is 0.
fn parse_view_count(s: Option<&str>) -> u64 {
    s.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

// ── Building candidates ──────────────────────────────────────────────────────

/// Merge search hits with their details records into candidates, keeping the
/// search order.  Hits without a video id are skipped.
pub fn build_candidates(hits: &[SearchHit], details: &[VideoDetails]) -> Vec<Candidate> {
    let by_id: HashMap<&str, &VideoDetails> =
        details.iter().map(|d| (d.id.as_str(), d)).collect();

    hits.iter()
        .filter_map(|hit| {
            let video_id = match hit.id.video_id.as_deref() {
                Some(id) if !id.is_empty() => id,
                _ => {
                    log::debug!("skipping search hit without video id");
                    return None;
                }
            };
            Some(build_candidate(video_id, hit, by_id.get(video_id).copied()))
        })
        .collect()
}

fn build_candidate(video_id: &str, hit: &SearchHit, details: Option<&VideoDetails>) -> Candidate {
    // Details snippet wins over the search snippet when present
    let snippet = details
        .and_then(|d| d.snippet.as_ref())
        .or(hit.snippet.as_ref());

    let view_count = parse_view_count(
        details
            .and_then(|d| d.statistics.as_ref())
            .and_then(|s| s.view_count.as_deref()),
    );

    let duration_seconds = details
        .and_then(|d| d.content_details.as_ref())
        .and_then(|c| c.duration.as_deref())
        .and_then(|raw| {
            let parsed = parse_iso8601_duration(raw);
            if parsed.is_none() {
                log::debug!("{}: unparseable duration {:?}", video_id, raw);
            }
            parsed
        });

    Candidate {
        video_id: video_id.to_string(),
        title: snippet.and_then(|s| s.title.clone()).unwrap_or_default(),
        channel_title: snippet.and_then(|s| s.channel_title.clone()).unwrap_or_default(),
        view_count,
        duration_seconds,
        category_id: snippet.and_then(|s| s.category_id.clone()),
        published_at: snippet.and_then(|s| s.published_at.clone()),
    }
}
