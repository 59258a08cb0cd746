//! Playback strategy selection and the auto-play bootstrap.
//!
//! A session picks exactly one of three strategies and never switches:
//! the media element plays HLS itself, a software HLS player feeds it, or
//! there is no way to play the stream at all.

use async_trait::async_trait;
use log::{debug, info};
use std::time::Duration;
use tokio::io::AsyncWrite;

use super::session::ResolvedStream;
use crate::config::HlsRetryConfig;
use crate::error::{AppError, Result};

/// MIME type of HLS playlists.
pub const HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// Byte sink a software HLS player writes media fragments into.
pub type Feed = Box<dyn AsyncWrite + Send + Unpin>;

/// Answer of [`MediaElement::can_play_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanPlayType {
    No,
    Maybe,
    Probably,
}

impl CanPlayType {
    pub fn is_playable(self) -> bool {
        self != CanPlayType::No
    }
}

/// What a media element should play.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// A URL the element fetches on its own.
    Url(String),
    /// Bytes pushed by a software player through [`MediaElement::take_feed`].
    Feed,
}

/// The thing that actually renders video.
pub trait MediaElement: Send {
    fn can_play_type(&self, mime: &str) -> CanPlayType;

    fn set_src(&mut self, src: MediaSource);

    /// Start playback of the current source.
    fn play(&mut self) -> Result<()>;

    /// The byte sink of a [`MediaSource::Feed`] element, available once after `play`.
    fn take_feed(&mut self) -> Option<Feed>;
}

/// Retry policy handed to a software HLS player.
#[derive(Debug, Clone, PartialEq)]
pub struct HlsConfig {
    pub manifest_loading_retry_delay: Duration,
    pub manifest_loading_max_retry: u32,
    pub frag_loading_max_retry: u32,
    pub frag_loading_retry_delay: Duration,
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self::from(&HlsRetryConfig::default())
    }
}

impl From<&HlsRetryConfig> for HlsConfig {
    fn from(retry: &HlsRetryConfig) -> Self {
        Self {
            manifest_loading_retry_delay: Duration::from_millis(retry.manifest_retry_delay_ms),
            manifest_loading_max_retry: retry.manifest_max_retry,
            frag_loading_max_retry: retry.fragment_max_retry,
            frag_loading_retry_delay: Duration::from_millis(retry.fragment_retry_delay_ms),
        }
    }
}

/// Emitted once the software player has parsed the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestParsed {
    /// Number of variants in the master playlist, 1 for a bare media playlist.
    pub levels: usize,
    /// Bandwidth of the chosen variant, if the master playlist listed one.
    pub bandwidth: Option<u64>,
    /// Fragments known at parse time.
    pub fragments: usize,
    /// The playlist may still grow.
    pub live: bool,
}

/// Factory for software HLS players, if the runtime has one.
pub trait HlsRuntime {
    type Player: HlsPlayer + 'static;

    fn is_supported(&self) -> bool;

    fn create(&self, config: HlsConfig) -> Self::Player;
}

/// A software HLS player.
#[async_trait]
pub trait HlsPlayer: Send {
    /// Remember the manifest URL to load.
    fn load_source(&mut self, src: &str);

    /// Point the element at this player's output.
    fn attach_media(&mut self, element: &mut dyn MediaElement);

    /// Load and parse the manifest; resolves when it has been parsed.
    async fn manifest_parsed(&mut self) -> Result<ManifestParsed>;

    /// Push fragments into `feed` until the stream ends or the feed closes.
    async fn stream_fragments(&mut self, feed: Feed) -> Result<()>;
}

/// The playback path chosen for a session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStrategy {
    Native,
    Software(HlsConfig),
    Unsupported,
}

impl PlaybackStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackStrategy::Native => "native HLS",
            PlaybackStrategy::Software(_) => "software HLS",
            PlaybackStrategy::Unsupported => "unsupported",
        }
    }
}

/// Pick the playback path for this element and runtime.
pub fn select_strategy<R: HlsRuntime>(
    element: &dyn MediaElement,
    runtime: &R,
    config: &HlsConfig,
) -> PlaybackStrategy {
    if element.can_play_type(HLS_MIME).is_playable() {
        PlaybackStrategy::Native
    } else if runtime.is_supported() {
        PlaybackStrategy::Software(config.clone())
    } else {
        PlaybackStrategy::Unsupported
    }
}

/// A started playback session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub title_id: String,
    pub src: String,
    pub cache_buster: u64,
    pub strategy: PlaybackStrategy,
}

/// Outcome of [`bootstrap`]: the session plus the software player, if one is feeding.
pub struct Started<P> {
    pub session: PlaybackSession,
    pub player: Option<P>,
}

/// Select a strategy for `stream` and start playback.
///
/// For the software path, `play` is only requested after the manifest has
/// been parsed. Fails with [`AppError::Unsupported`] when no path exists.
pub async fn bootstrap<R: HlsRuntime>(
    stream: &ResolvedStream,
    element: &mut dyn MediaElement,
    runtime: &R,
    config: &HlsConfig,
) -> Result<Started<R::Player>> {
    let strategy = select_strategy(&*element, runtime, config);
    let src = stream.src.to_string();
    info!("Playing title {} via {}", stream.title_id, strategy.label());

    let player = match &strategy {
        PlaybackStrategy::Native => {
            element.set_src(MediaSource::Url(src.clone()));
            element.play()?;
            None
        }
        PlaybackStrategy::Software(hls_config) => {
            let mut player = runtime.create(hls_config.clone());
            player.load_source(&src);
            player.attach_media(element);
            let parsed = player.manifest_parsed().await?;
            debug!(
                "Manifest parsed: {} level(s), {} fragment(s), live={}",
                parsed.levels, parsed.fragments, parsed.live
            );
            element.play()?;
            Some(player)
        }
        PlaybackStrategy::Unsupported => {
            return Err(AppError::Unsupported(
                "this player cannot play HLS and no software HLS loader is available".to_string(),
            ));
        }
    };

    Ok(Started {
        session: PlaybackSession {
            title_id: stream.title_id.clone(),
            src,
            cache_buster: stream.cache_buster,
            strategy,
        },
        player,
    })
}

/// Drive a software player until its stream ends.
pub async fn feed_element<P: HlsPlayer>(
    player: &mut P,
    element: &mut dyn MediaElement,
) -> Result<()> {
    let feed = element
        .take_feed()
        .ok_or_else(|| AppError::Player("media element has no feed to write to".to_string()))?;
    player.stream_fragments(feed).await
}
