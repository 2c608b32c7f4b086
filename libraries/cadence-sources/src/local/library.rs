//! In-memory local track library
//!
//! Built from configured tracks plus a scan of the configured directories.
//! Tags are read with lofty; files without a title tag fall back to their
//! file stem.

use crate::config::LocalSourceConfig;
use cadence_core::{SourceKind, Track};
use lofty::{AudioFile, ItemKey, TaggedFileExt};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

/// Searchable list of local tracks
#[derive(Debug, Clone, Default)]
pub struct LocalLibrary {
    tracks: Vec<Track>,
}

impl LocalLibrary {
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut seen = HashSet::new();
        let tracks = tracks
            .into_iter()
            .map(|track| track.with_source(SourceKind::Local))
            .filter(|track| seen.insert(track.id.clone()))
            .collect();

        Self { tracks }
    }

    /// Configured tracks followed by every scanned file
    pub fn from_config(config: &LocalSourceConfig) -> Self {
        let mut tracks = config.tracks.clone();
        for dir in &config.library_dirs {
            tracks.extend(scan_directory(dir, &config.extensions));
        }
        Self::new(tracks)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks whose title, artist or album contain `query`
    pub fn search(&self, query: &str) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|track| track.matches_query(query))
            .cloned()
            .collect()
    }

    /// The first `limit` tracks
    pub fn recommendations(&self, limit: usize) -> Vec<Track> {
        self.tracks.iter().take(limit).cloned().collect()
    }
}

/// Read every audio file under `dir` into a track
pub fn scan_directory(dir: &Path, extensions: &[String]) -> Vec<Track> {
    if !dir.is_dir() {
        warn!(path = %dir.display(), "Library directory not found, skipping");
        return Vec::new();
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extensions) {
            continue;
        }

        match read_track(path) {
            Some(track) => tracks.push(track),
            None => debug!(path = %path.display(), "Skipping unreadable file"),
        }
    }

    debug!(path = %dir.display(), count = tracks.len(), "Scanned library directory");
    tracks
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
}

/// Build a track from a file; `None` if the path has no usable URL
pub fn read_track(path: &Path) -> Option<Track> {
    let absolute = path.canonicalize().ok()?;
    let url = Url::from_file_path(&absolute).ok()?;

    let stem = absolute
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();

    let mut title = None;
    let mut artist = None;
    let mut album = None;
    let mut duration = 0.0;

    match lofty::read_from_path(&absolute) {
        Ok(tagged_file) => {
            duration = tagged_file.properties().duration().as_secs_f64();

            let tag = tagged_file
                .primary_tag()
                .or_else(|| tagged_file.tags().first());
            if let Some(tag) = tag {
                for item in tag.items() {
                    let text = item.value().text().map(|s| s.to_string());
                    match item.key() {
                        ItemKey::TrackTitle => title = text,
                        ItemKey::TrackArtist => artist = text,
                        ItemKey::AlbumTitle => album = text,
                        _ => {}
                    }
                }
            }
        }
        Err(e) => {
            debug!(path = %absolute.display(), error = %e, "No readable tags");
        }
    }

    let id = format!("local:{}", absolute.display());
    Some(
        Track::new(
            id,
            title.unwrap_or(stem),
            artist.unwrap_or_else(|| "Unknown Artist".to_string()),
            album.unwrap_or_else(|| "Unknown Album".to_string()),
            duration,
            SourceKind::Local,
        )
        .with_url(url.to_string()),
    )
}
