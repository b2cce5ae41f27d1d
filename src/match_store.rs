//! Simple file-based store of the current video match per song.
//!
//! One entry per line: `<key>\t<json>`, where the key is the normalized
//! `artist|song` and the JSON is a [`StoredMatch`].  Updates are appended;
//! when a key appears more than once the last line wins.  [`MatchStore::compact`]
//! rewrites the file with one line per key.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::selector::StoredMatch;
use crate::text::normalize;

pub struct MatchStore {
    path: PathBuf,
    entries: BTreeMap<String, StoredMatch>,
}

/// Store key for a song.
pub fn song_key(artist: &str, song: &str) -> String {
    format!("{}|{}", normalize(artist), normalize(song))
}

impl MatchStore {
    /// Open the store at `path`; a missing file is an empty store.
    /// Unparseable lines are skipped.
    pub fn open(path: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();

        let file = match fs::File::open(path) {
            Ok(f) => Some(f),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if let Some(file) = file {
            for (n, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                let Some((key, json)) = line.split_once('\t') else {
                    continue;
                };
                match serde_json::from_str::<StoredMatch>(json) {
                    Ok(m) => {
                        entries.insert(key.to_string(), m);
                    }
                    Err(e) => log::warn!("{}:{}: skipping bad entry: {}", path.display(), n + 1, e),
                }
            }
        }

        Ok(MatchStore { path: path.to_path_buf(), entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, artist: &str, song: &str) -> Option<&StoredMatch> {
        self.entries.get(&song_key(artist, song))
    }

    /// Record `m` for the song and append it to the file.
    pub fn put(&mut self, artist: &str, song: &str, m: StoredMatch) -> Result<()> {
        let key = song_key(artist, song);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}\t{}", key, serde_json::to_string(&m)?)?;
        self.entries.insert(key, m);
        Ok(())
    }

    /// Rewrite the file with exactly one line per song.
    pub fn compact(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            for (key, m) in &self.entries {
                writeln!(file, "{}\t{}", key, serde_json::to_string(m)?)?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
