//! Text helpers shared by the scoring signals.

use std::collections::HashSet;

/// Lower-case `text`, collapse every run of characters outside `[a-z0-9]`
/// into a single space and trim the result.  Non-ASCII letters count as
/// separators.
///
/// "Taylor Swift - cardigan (Official Video)" → "taylor swift cardigan official video"
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// The set of words of the normalized form of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    normalize(text).split(' ').filter(|w| !w.is_empty()).map(String::from).collect()
}

/// Jaccard overlap of the two word sets: |A ∩ B| / |A ∪ B|.
/// Returns 0.0 when either side has no words.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let sa = token_set(a);
    let sb = token_set(b);
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let common = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    common as f64 / union as f64
}

/// Case-insensitive check whether `text` contains any of `phrases`.
/// Phrases are expected to be lower-case already.
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}
