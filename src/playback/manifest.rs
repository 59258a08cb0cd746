//! Minimal HLS playlist parser.
//!
//! Understands master playlists (`#EXT-X-STREAM-INF` variants) and media
//! playlists (`#EXTINF` segments), which is all the built-in loader needs to
//! pick a variant and walk its fragments.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{AppError, Result};

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Z0-9-]+)=("[^"]*"|[^,]*)"#).expect("attribute regex is valid")
});

/// One rendition listed in a master playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: u64,
    pub resolution: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterPlaylist {
    pub variants: Vec<Variant>,
}

impl MasterPlaylist {
    /// The variant with the highest bandwidth, ties going to the first listed.
    pub fn best_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .rev()
            .max_by_key(|v| v.bandwidth)
    }
}

/// One media fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Media sequence number of this fragment.
    pub sequence: u64,
    /// Duration in seconds.
    pub duration: f64,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    pub target_duration: u64,
    pub media_sequence: u64,
    pub segments: Vec<Segment>,
    /// `#EXT-X-ENDLIST` was present; no more fragments will appear.
    pub ended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Master(MasterPlaylist),
    Media(MediaPlaylist),
}

/// Parse the text of an `.m3u8` playlist.
pub fn parse_playlist(text: &str) -> Result<Playlist> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first.starts_with("#EXTM3U") => {}
        _ => return Err(AppError::Parse("playlist does not start with #EXTM3U".into())),
    }

    let mut variants = Vec::new();
    let mut pending_variant: Option<(u64, Option<(u32, u32)>)> = None;

    let mut target_duration = 0;
    let mut media_sequence: u64 = 0;
    let mut segments = Vec::new();
    let mut pending_duration: Option<f64> = None;
    let mut ended = false;

    for line in lines {
        if let Some(rest) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            let attrs = parse_attributes(rest);
            let bandwidth = attrs
                .get("BANDWIDTH")
                .and_then(|b| b.parse().ok())
                .unwrap_or(0);
            let resolution = attrs.get("RESOLUTION").and_then(|r| parse_resolution(r));
            pending_variant = Some((bandwidth, resolution));
        } else if let Some(rest) = line.strip_prefix("#EXTINF:") {
            let value = rest.split(',').next().unwrap_or("").trim();
            let duration = value
                .parse::<f64>()
                .map_err(|_| AppError::Parse(format!("bad #EXTINF duration '{}'", value)))?;
            pending_duration = Some(duration);
        } else if let Some(rest) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
            target_duration = rest
                .trim()
                .parse()
                .map_err(|_| AppError::Parse(format!("bad target duration '{}'", rest)))?;
        } else if let Some(rest) = line.strip_prefix("#EXT-X-MEDIA-SEQUENCE:") {
            media_sequence = rest
                .trim()
                .parse()
                .map_err(|_| AppError::Parse(format!("bad media sequence '{}'", rest)))?;
        } else if line == "#EXT-X-ENDLIST" {
            ended = true;
        } else if line.starts_with('#') {
            // Tags the loader does not act on.
        } else if let Some((bandwidth, resolution)) = pending_variant.take() {
            variants.push(Variant {
                uri: line.to_string(),
                bandwidth,
                resolution,
            });
        } else if let Some(duration) = pending_duration.take() {
            let sequence = media_sequence
                .checked_add(segments.len() as u64)
                .ok_or_else(|| AppError::Parse("media sequence overflows".into()))?;
            segments.push(Segment {
                sequence,
                duration,
                uri: line.to_string(),
            });
        }
    }

    if !variants.is_empty() {
        return Ok(Playlist::Master(MasterPlaylist { variants }));
    }

    Ok(Playlist::Media(MediaPlaylist {
        target_duration,
        media_sequence,
        segments,
        ended,
    }))
}

fn parse_attributes(list: &str) -> HashMap<String, String> {
    ATTRIBUTE_RE
        .captures_iter(list)
        .map(|caps| {
            let value = caps[2].trim_matches('"').to_string();
            (caps[1].to_string(), value)
        })
        .collect()
}

fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}
