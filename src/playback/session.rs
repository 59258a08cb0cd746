//! Stream resolution: from a `/watch/{id}` location to a playable URL.

use log::debug;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

use crate::api::ApiClient;
use crate::error::{AppError, Result};

/// Name of the cache-busting query parameter.
pub const CACHE_BUST_PARAM: &str = "t";

/// Extract the title id from the final path segment of a location.
///
/// Accepts a bare path (`/watch/12`), a full URL or a bare id. Query strings,
/// fragments and trailing slashes are ignored.
///
/// # Examples
///
/// ```
/// use mytv::playback::title_id_from_location;
///
/// assert_eq!(title_id_from_location("/watch/12").unwrap(), "12");
/// assert_eq!(title_id_from_location("http://nas:8080/watch/7?x=1").unwrap(), "7");
/// assert_eq!(title_id_from_location("31").unwrap(), "31");
/// assert!(title_id_from_location("/").is_err());
/// ```
pub fn title_id_from_location(location: &str) -> Result<String> {
    let path = match Url::parse(location) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput(format!("no title id in '{}'", location)))
}

/// Append the cache-busting parameter, joining with `?` or `&`.
///
/// # Examples
///
/// ```
/// use mytv::playback::cache_bust;
///
/// assert_eq!(cache_bust("https://x/a.m3u8", 5), "https://x/a.m3u8?t=5");
/// assert_eq!(cache_bust("https://x/a.m3u8?v=2", 5), "https://x/a.m3u8?v=2&t=5");
/// ```
pub fn cache_bust(url: &str, token: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, CACHE_BUST_PARAM, token)
}

/// Milliseconds since the Unix epoch, used as the cache-busting token.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A stream ready to be handed to a playback strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub title_id: String,
    /// Manifest URL exactly as the server returned it.
    pub manifest: String,
    pub cache_buster: u64,
    /// Absolute, cache-busted manifest URL.
    pub src: Url,
}

/// Resolve the stream for the title named by `location`.
pub async fn resolve_stream(
    api: &ApiClient,
    location: &str,
    cache_buster: u64,
) -> Result<ResolvedStream> {
    let title_id = title_id_from_location(location)?;
    let descriptor = api.resolve_stream(&title_id).await?;
    let src = api.resolve(&cache_bust(&descriptor.m3u8, cache_buster))?;

    debug!("Title {} streams from {}", title_id, src);

    Ok(ResolvedStream {
        title_id,
        manifest: descriptor.m3u8,
        cache_buster,
        src,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_id_variants() {
        assert_eq!(title_id_from_location("/watch/12/").unwrap(), "12");
        assert_eq!(title_id_from_location("/watch/12#top").unwrap(), "12");
        assert_eq!(
            title_id_from_location("https://tv.local/watch/abc").unwrap(),
            "abc"
        );
        assert!(matches!(
            title_id_from_location(""),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cache_bust_relative_path() {
        assert_eq!(
            cache_bust("/hls/3/master.m3u8", 1700000000000),
            "/hls/3/master.m3u8?t=1700000000000"
        );
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in milliseconds
        assert!(now_millis() > 1_577_836_800_000);
    }
}
