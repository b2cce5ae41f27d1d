//! Heuristic scoring of video candidates.
//!
//! Every signal looks at the candidate and the queried artist/song and either
//! contributes a [`Reason`] (label + signed delta) or nothing.  Signals run in
//! a fixed order and the score is the sum of the collected deltas, so the
//! reasons list is a complete audit trail of how a score came about.

use crate::candidate::{Candidate, Reason, ScoredCandidate};
use crate::similarity::TextSimilarity;
use crate::text::{contains_any, normalize, token_overlap};

/// Numeric weights and thresholds of the scoring signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub official_keyword: f64,
    pub category_music: f64,
    pub vevo_channel: f64,
    pub artist_channel_exact: f64,
    /// Multiplied by the overlap ratio
    pub good_title_match: f64,
    pub title_overlap_threshold: f64,
    /// Multiplied by similarity / 100
    pub rapidfuzz_similarity: f64,
    pub similarity_threshold: f64,
    pub similarity_low_penalty: f64,
    /// Per view
    pub view_count: f64,
    pub view_count_cap: f64,
    pub duration_in_range: f64,
    pub duration_out_of_range: f64,
    pub duration_min: u64,
    pub duration_max: u64,
    pub lyrics_penalty: f64,
    pub audio_penalty: f64,
    pub visualizer_penalty: f64,
    pub static_image_penalty: f64,
    pub live_penalty: f64,
    pub cover_penalty: f64,
    pub remix_penalty: f64,
}

pub const WEIGHTS: ScoreWeights = ScoreWeights {
    official_keyword: 25.0,
    category_music: 10.0,
    vevo_channel: 28.0,
    artist_channel_exact: 35.0,
    good_title_match: 22.0,
    title_overlap_threshold: 0.5,
    rapidfuzz_similarity: 30.0,
    similarity_threshold: 60.0,
    similarity_low_penalty: -5.0,
    view_count: 0.000005,
    view_count_cap: 18.0,
    duration_in_range: 8.0,
    duration_out_of_range: -5.0,
    duration_min: 90,
    duration_max: 600,
    lyrics_penalty: -30.0,
    audio_penalty: -22.0,
    visualizer_penalty: -18.0,
    static_image_penalty: -12.0,
    // Live cuts are worse than the official video but better than lyric/static uploads
    live_penalty: -10.0,
    cover_penalty: -14.0,
    remix_penalty: -6.0,
};

/// YouTube's "Music" category.
pub const MUSIC_CATEGORY_ID: &str = "10";

pub const OFFICIAL_KEYWORDS: &[&str] = &[
    "official video",
    "official music video",
    "official mv",
    "official hd",
    "official 4k",
    "official visual",
];
pub const OFFICIAL_CHANNEL_HINTS: &[&str] = &["vevo"];

pub const BLOCK_LYRIC: &[&str] = &["lyric video", "lyrics", "l y r i c", "letra"];
pub const BLOCK_AUDIO: &[&str] = &["audio only", "official audio", "full audio", "hq audio"];
pub const BLOCK_VISUALIZER: &[&str] = &["visualizer", "visualiser"];
pub const BLOCK_STATIC: &[&str] = &["still image", "static image"];
pub const BLOCK_LIVE: &[&str] = &["live at", "live from", "live session", "live performance"];
pub const BLOCK_COVER: &[&str] = &["cover by", "acoustic cover"];
pub const BLOCK_REMIX: &[&str] = &["remix", "bootleg"];

// ── Signals ──────────────────────────────────────────────────────────────────

/// Everything a signal may look at, computed once per candidate.
struct SignalInput<'a> {
    candidate: &'a Candidate,
    title_lower: String,
    artist: &'a str,
    song: &'a str,
    artist_norm: String,
    song_norm: String,
    similarity: Option<&'a dyn TextSimilarity>,
}

type Signal = fn(&SignalInput<'_>) -> Option<Reason>;

/// Evaluation order matters: it is the order of the reasons list.
const SIGNALS: &[Signal] = &[
    official_keyword,
    category_music,
    vevo_channel,
    artist_channel,
    title_overlap,
    fuzzy_similarity,
    view_count,
    duration_range,
    lyrics_penalty,
    audio_penalty,
    visualizer_penalty,
    static_image_penalty,
    live_penalty,
    cover_penalty,
    remix_penalty,
];

fn phrase_signal(input: &SignalInput<'_>, phrases: &[&str], label: &str, delta: f64) -> Option<Reason> {
    contains_any(&input.title_lower, phrases).then(|| Reason::new(label, delta))
}

fn official_keyword(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, OFFICIAL_KEYWORDS, "official_keyword", WEIGHTS.official_keyword)
}

fn category_music(input: &SignalInput<'_>) -> Option<Reason> {
    (input.candidate.category_id.as_deref() == Some(MUSIC_CATEGORY_ID))
        .then(|| Reason::new("category_music", WEIGHTS.category_music))
}

fn vevo_channel(input: &SignalInput<'_>) -> Option<Reason> {
    contains_any(&input.candidate.channel_title, OFFICIAL_CHANNEL_HINTS)
        .then(|| Reason::new("vevo_channel", WEIGHTS.vevo_channel))
}

/// An artist that normalizes to nothing matches every channel.
fn artist_channel(input: &SignalInput<'_>) -> Option<Reason> {
    normalize(&input.candidate.channel_title)
        .contains(&input.artist_norm)
        .then(|| Reason::new("artist_channel_exact", WEIGHTS.artist_channel_exact))
}

fn title_overlap(input: &SignalInput<'_>) -> Option<Reason> {
    let query = format!("{} {}", input.artist, input.song);
    let overlap = token_overlap(&input.candidate.title, &query);
    (overlap > WEIGHTS.title_overlap_threshold).then(|| {
        Reason::new(format!("title_overlap_{:.2}", overlap), WEIGHTS.good_title_match * overlap)
    })
}

fn fuzzy_similarity(input: &SignalInput<'_>) -> Option<Reason> {
    let similarity = input.similarity?;
    let query = format!("{} {}", input.artist, input.song);
    let sim = similarity.similarity(query.trim(), &input.candidate.title);
    if sim >= WEIGHTS.similarity_threshold {
        Some(Reason::new(format!("rf_sim_{:.0}", sim), WEIGHTS.rapidfuzz_similarity * (sim / 100.0)))
    } else {
        Some(Reason::new(format!("rf_low_{:.0}", sim), WEIGHTS.similarity_low_penalty))
    }
}

fn view_count(input: &SignalInput<'_>) -> Option<Reason> {
    let views = input.candidate.view_count;
    (views > 0).then(|| {
        let pts = (views as f64 * WEIGHTS.view_count).min(WEIGHTS.view_count_cap);
        Reason::new("view_count_scaled", pts)
    })
}

/// Unknown duration is neither a bonus nor a penalty.
fn duration_range(input: &SignalInput<'_>) -> Option<Reason> {
    let secs = input.candidate.duration_seconds?;
    if (WEIGHTS.duration_min..=WEIGHTS.duration_max).contains(&secs) {
        Some(Reason::new("duration_in_range", WEIGHTS.duration_in_range))
    } else {
        Some(Reason::new("duration_out_of_range", WEIGHTS.duration_out_of_range))
    }
}

fn lyrics_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_LYRIC, "lyrics_penalty", WEIGHTS.lyrics_penalty)
}

fn audio_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_AUDIO, "audio_penalty", WEIGHTS.audio_penalty)
}

fn visualizer_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_VISUALIZER, "visualizer_penalty", WEIGHTS.visualizer_penalty)
}

fn static_image_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_STATIC, "static_image_penalty", WEIGHTS.static_image_penalty)
}

fn live_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_LIVE, "live_penalty", WEIGHTS.live_penalty)
}

fn cover_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    phrase_signal(input, BLOCK_COVER, "cover_penalty", WEIGHTS.cover_penalty)
}

/// Remix uploads are only penalized when the charted song is not itself a remix.
fn remix_penalty(input: &SignalInput<'_>) -> Option<Reason> {
    if input.song_norm.contains("remix") {
        return None;
    }
    phrase_signal(input, BLOCK_REMIX, "remix_penalty", WEIGHTS.remix_penalty)
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Score one candidate for `artist` / `song`.
///
/// Pure: the same inputs always give the same score and the same ordered
/// reasons.  Pass `None` for `similarity` to skip the fuzzy signal.
pub fn score_candidate(
    candidate: Candidate,
    artist: &str,
    song: &str,
    similarity: Option<&dyn TextSimilarity>,
) -> ScoredCandidate {
    let reasons: Vec<Reason> = {
        let input = SignalInput {
            candidate: &candidate,
            title_lower: candidate.title.to_lowercase(),
            artist,
            song,
            artist_norm: normalize(artist),
            song_norm: normalize(song),
            similarity,
        };
        SIGNALS.iter().filter_map(|signal| signal(&input)).collect()
    };

    let score = reasons.iter().fold(0.0, |acc, r| acc + r.delta);

    ScoredCandidate { candidate, score, reasons }
}
