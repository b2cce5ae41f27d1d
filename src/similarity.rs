//! Pluggable title-similarity capability used by the fuzzy scoring signal.
//!
//! The scorer only needs one thing: a 0–100 similarity between the query
//! (`"{artist} {song}"`) and a video title.  [`FuzzySimilarity`] is the
//! high-quality implementation (compiled in with the default `fuzzy`
//! feature); [`TokenOverlapSimilarity`] is a dependency-free fallback.
//! When no capability is configured the fuzzy signal is skipped entirely.

use serde::{Deserialize, Serialize};

use crate::text;

/// Normalized similarity between two strings, in `0.0..=100.0`.
pub trait TextSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Which similarity capability to use, as named in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityKind {
    Fuzzy,
    TokenOverlap,
    None,
}

impl Default for SimilarityKind {
    fn default() -> Self {
        if cfg!(feature = "fuzzy") {
            SimilarityKind::Fuzzy
        } else {
            SimilarityKind::None
        }
    }
}

impl SimilarityKind {
    /// Build the configured capability.  `None` means "skip the signal".
    pub fn build(self) -> Option<Box<dyn TextSimilarity>> {
        match self {
            #[cfg(feature = "fuzzy")]
            SimilarityKind::Fuzzy => Some(Box::new(FuzzySimilarity)),
            #[cfg(not(feature = "fuzzy"))]
            SimilarityKind::Fuzzy => {
                log::warn!("fuzzy similarity requested but not compiled in, skipping signal");
                None
            }
            SimilarityKind::TokenOverlap => Some(Box::new(TokenOverlapSimilarity)),
            SimilarityKind::None => None,
        }
    }
}

/// Word-set Jaccard overlap scaled to 0–100.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapSimilarity;

impl TextSimilarity for TokenOverlapSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        text::token_overlap(a, b) * 100.0
    }
}

/// Hybrid of a token-set ratio and a partial-substring ratio; the larger of
/// the two wins.  Both work on normalized text, so case and punctuation
/// never matter.
#[cfg(feature = "fuzzy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzySimilarity;

#[cfg(feature = "fuzzy")]
impl TextSimilarity for FuzzySimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = text::normalize(a);
        let b = text::normalize(b);
        token_set_ratio(&a, &b).max(partial_ratio(&a, &b))
    }
}

/// Edit-distance ratio of two strings, 0–100.  Empty input scores 0.
#[cfg(feature = "fuzzy")]
fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Compare the shared words against each side's full word set.
/// If every word of one side appears in the other the result is 100.
#[cfg(feature = "fuzzy")]
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = text::token_set(a);
    let tb = text::token_set(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sorted_join = |words: Vec<&String>| {
        let mut words: Vec<&str> = words.into_iter().map(String::as_str).collect();
        words.sort_unstable();
        words.join(" ")
    };

    let common = sorted_join(ta.intersection(&tb).collect());
    let only_a = sorted_join(ta.difference(&tb).collect());
    let only_b = sorted_join(tb.difference(&ta).collect());

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let join = |x: &str, y: &str| match (x.is_empty(), y.is_empty()) {
        (true, _) => y.to_string(),
        (_, true) => x.to_string(),
        _ => format!("{} {}", x, y),
    };
    let with_a = join(&common, &only_a);
    let with_b = join(&common, &only_b);

    ratio(&common, &with_a)
        .max(ratio(&common, &with_b))
        .max(ratio(&with_a, &with_b))
}

/// Best ratio of the shorter string against every equally long window of
/// the longer one.
#[cfg(feature = "fuzzy")]
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() == short_len {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let window: String = window.iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_overlap_similarity() {
        let s = TokenOverlapSimilarity.similarity("Taylor Swift Cardigan", "cardigan - taylor swift");
        assert!((s - 100.0).abs() < 1e-9);
        assert_eq!(TokenOverlapSimilarity.similarity("", "cardigan"), 0.0);
    }

    #[test]
    fn test_none_kind_builds_nothing() {
        assert!(SimilarityKind::None.build().is_none());
        assert!(SimilarityKind::TokenOverlap.build().is_some());
    }

    #[cfg(feature = "fuzzy")]
    #[test]
    fn test_fuzzy_reordered_words_are_full_match() {
        let s = FuzzySimilarity.similarity("Taylor Swift Cardigan", "Cardigan by Taylor Swift (Official Video)");
        assert_eq!(s, 100.0);
    }

    #[cfg(feature = "fuzzy")]
    #[test]
    fn test_fuzzy_ranks_misspelled_teaser_lower() {
        let query = "Taylor Swift Cardigan";
        let good = FuzzySimilarity.similarity(query, "Cardigan by Taylor Swift (Official Video)");
        let poor = FuzzySimilarity.similarity(query, "Swift Taylor - Crdgn (Teaser)");
        assert!(good > poor, "good={} poor={}", good, poor);
        assert!(poor < 100.0);
    }

    #[cfg(feature = "fuzzy")]
    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("cardigan", "taylor swift cardigan official"), 100.0);
        assert_eq!(partial_ratio("", "cardigan"), 0.0);
    }

    #[cfg(feature = "fuzzy")]
    #[test]
    fn test_fuzzy_unrelated_is_low() {
        let s = FuzzySimilarity.similarity("Taylor Swift Cardigan", "Minecraft speedrun world record");
        assert!(s < 60.0, "similarity={}", s);
    }
}
