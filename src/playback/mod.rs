//! Playback bootstrap: resolve a title's stream and start it on a player.
//!
//! The session resolves `/stream/{id}`, appends a cache-busting token to
//! the manifest URL, then hands it to the external player directly when the
//! player understands HLS, or through the built-in software loader when it
//! does not.

mod manifest;
mod player;
mod session;
mod software;
mod strategy;

pub use manifest::{MasterPlaylist, MediaPlaylist, Playlist, Segment, Variant, parse_playlist};
pub use player::{ExternalPlayer, default_player, detect_native_hls, find_in_path};
pub use session::{
    CACHE_BUST_PARAM, ResolvedStream, cache_bust, now_millis, resolve_stream,
    title_id_from_location,
};
pub use software::{SoftwareHls, SoftwareHlsPlayer};
pub use strategy::{
    CanPlayType, Feed, HLS_MIME, HlsConfig, HlsPlayer, HlsRuntime, ManifestParsed, MediaElement,
    MediaSource, PlaybackSession, PlaybackStrategy, Started, bootstrap, feed_element,
    select_strategy,
};
