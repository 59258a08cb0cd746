//! Built-in software HLS player.
//!
//! Used when the media element cannot play HLS by itself: the manifest and its
//! fragments are fetched here and written, in order, into the element's feed.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use url::Url;

use super::manifest::{MediaPlaylist, Playlist, parse_playlist};
use super::strategy::{
    Feed, HlsConfig, HlsPlayer, HlsRuntime, ManifestParsed, MediaElement, MediaSource,
};
use crate::api::ApiClient;
use crate::error::{AppError, Result};

/// Retry an async operation with a fixed delay.
///
/// Runs `f` once plus up to `max_retry` more times while the error is
/// retryable, sleeping `delay` between attempts.
async fn retry_fixed<T, F, Fut>(
    operation_name: &str,
    max_retry: u32,
    delay: Duration,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!("{} succeeded after {} attempts", operation_name, attempt + 1);
                }
                return Ok(result);
            }
            Err(e) if attempt < max_retry && e.is_retryable() => {
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name,
                    attempt + 1,
                    max_retry + 1,
                    e,
                    delay
                );
                attempt += 1;
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Runtime that hands out [`SoftwareHlsPlayer`]s.
#[derive(Debug, Clone)]
pub struct SoftwareHls {
    api: ApiClient,
    enabled: bool,
}

impl SoftwareHls {
    pub fn new(api: ApiClient, enabled: bool) -> Self {
        Self { api, enabled }
    }
}

impl HlsRuntime for SoftwareHls {
    type Player = SoftwareHlsPlayer;

    fn is_supported(&self) -> bool {
        self.enabled
    }

    fn create(&self, config: HlsConfig) -> SoftwareHlsPlayer {
        SoftwareHlsPlayer::new(self.api.clone(), config)
    }
}

/// Fetches a stream and pushes its fragments into a media element.
#[derive(Debug)]
pub struct SoftwareHlsPlayer {
    api: ApiClient,
    config: HlsConfig,
    source: Option<String>,
    attached: bool,
    media: Option<(Url, MediaPlaylist)>,
}

impl SoftwareHlsPlayer {
    pub fn new(api: ApiClient, config: HlsConfig) -> Self {
        Self {
            api,
            config,
            source: None,
            attached: false,
            media: None,
        }
    }

    pub fn config(&self) -> &HlsConfig {
        &self.config
    }

    async fn load_playlist(&self, url: &Url) -> Result<Playlist> {
        let text = retry_fixed(
            "Manifest load",
            self.config.manifest_loading_max_retry,
            self.config.manifest_loading_retry_delay,
            || self.api.get_text(url),
        )
        .await?;
        parse_playlist(&text)
    }

    async fn load_fragment(&self, url: &Url) -> Result<Vec<u8>> {
        retry_fixed(
            "Fragment load",
            self.config.frag_loading_max_retry,
            self.config.frag_loading_retry_delay,
            || self.api.get_bytes(url),
        )
        .await
    }
}

#[async_trait]
impl HlsPlayer for SoftwareHlsPlayer {
    fn load_source(&mut self, src: &str) {
        self.source = Some(src.to_string());
    }

    fn attach_media(&mut self, element: &mut dyn MediaElement) {
        element.set_src(MediaSource::Feed);
        self.attached = true;
    }

    async fn manifest_parsed(&mut self) -> Result<ManifestParsed> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| AppError::Player("no source loaded".to_string()))?;
        let url = self.api.resolve(source)?;

        let (levels, bandwidth, media_url, media) = match self.load_playlist(&url).await? {
            Playlist::Media(media) => (1, None, url, media),
            Playlist::Master(master) => {
                let variant = master
                    .best_variant()
                    .ok_or_else(|| AppError::Parse("master playlist has no variants".into()))?;
                let variant_url = url.join(&variant.uri)?;
                debug!(
                    "Selected variant {} ({} bps)",
                    variant_url, variant.bandwidth
                );
                match self.load_playlist(&variant_url).await? {
                    Playlist::Media(media) => (
                        master.variants.len(),
                        Some(variant.bandwidth),
                        variant_url,
                        media,
                    ),
                    Playlist::Master(_) => {
                        return Err(AppError::Parse(
                            "variant points at another master playlist".into(),
                        ));
                    }
                }
            }
        };

        let parsed = ManifestParsed {
            levels,
            bandwidth,
            fragments: media.segments.len(),
            live: !media.ended,
        };
        self.media = Some((media_url, media));
        Ok(parsed)
    }

    async fn stream_fragments(&mut self, mut feed: Feed) -> Result<()> {
        if !self.attached {
            return Err(AppError::Player("no media element attached".to_string()));
        }
        let (media_url, mut playlist) = self
            .media
            .take()
            .ok_or_else(|| AppError::Player("manifest has not been parsed".to_string()))?;

        // Sequence number of the last fragment written, if any.
        let mut last_written: Option<u64> = None;
        let mut written = 0usize;

        loop {
            let from = last_written;
            for segment in playlist
                .segments
                .iter()
                .filter(|s| from.is_none_or(|last| s.sequence > last))
            {
                let url = media_url.join(&segment.uri)?;
                let bytes = self.load_fragment(&url).await?;

                if let Err(e) = feed.write_all(&bytes).await {
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        info!("Player closed its input after {} fragments", written);
                        return Ok(());
                    }
                    return Err(e.into());
                }
                last_written = Some(segment.sequence);
                written += 1;
            }

            if playlist.ended {
                break;
            }

            let wait = Duration::from_secs(playlist.target_duration.max(1));
            sleep(wait).await;

            playlist = match self.load_playlist(&media_url).await? {
                Playlist::Media(media) => media,
                Playlist::Master(_) => {
                    return Err(AppError::Parse("media playlist turned into a master".into()));
                }
            };
        }

        feed.shutdown().await.ok();
        info!("Stream finished after {} fragments", written);
        Ok(())
    }
}
