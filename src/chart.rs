//! Weekly chart entries as produced by the chart scraper.
//!
//! The scraper writes one JSON array per chart date; only `song_name` and
//! `artist` matter for video matching, the rest is carried for display.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub position: u32,
    pub song_name: String,
    pub artist: String,
    /// Last week's position
    #[serde(default)]
    pub lw: Option<u32>,
    #[serde(default)]
    pub peak: Option<u32>,
    #[serde(default)]
    pub weeks: Option<u32>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_reentry: bool,
}

/// Read a chart file, sorted by position.
pub fn load_chart(path: &Path) -> Result<Vec<ChartEntry>> {
    let content = fs::read_to_string(path)?;
    parse_chart(&content)
}

pub fn parse_chart(json: &str) -> Result<Vec<ChartEntry>> {
    let mut entries: Vec<ChartEntry> = serde_json::from_str(json)?;
    entries.sort_by_key(|e| e.position);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_sorts_by_position() {
        let json = r#"[
            {"position": 2, "song_name": "Willow", "artist": "Taylor Swift", "lw": 1, "peak": 1, "weeks": 3},
            {"position": 1, "song_name": "Cardigan", "artist": "Taylor Swift", "is_new": true}
        ]"#;
        let entries = parse_chart(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].song_name, "Cardigan");
        assert!(entries[0].is_new);
        assert_eq!(entries[0].lw, None);
        assert_eq!(entries[1].peak, Some(1));
        assert!(!entries[1].is_reentry);
    }

    #[test]
    fn test_parse_chart_rejects_missing_artist() {
        let json = r#"[{"position": 1, "song_name": "Cardigan"}]"#;
        assert!(matches!(parse_chart(json), Err(crate::Error::Json(_))));
    }
}
