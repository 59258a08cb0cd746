//! Type definitions for the mytv client.
//!
//! This module contains the records received from the media library server
//! and the small formatting helpers used to display them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A title as listed by the catalog endpoint.
///
/// Only `ID` is required. Every other field degrades gracefully when it is
/// missing or malformed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Title {
    /// Unique, stable identifier.
    #[serde(rename = "ID")]
    pub id: u64,

    /// Display name, if the server knows one.
    #[serde(rename = "Title", default, deserialize_with = "lenient")]
    pub name: Option<String>,

    /// Duration in seconds.
    #[serde(rename = "Duration", default, deserialize_with = "lenient")]
    pub duration: Option<f64>,

    /// Video width in pixels.
    #[serde(rename = "Width", default, deserialize_with = "lenient")]
    pub width: Option<u32>,

    /// Video height in pixels.
    #[serde(rename = "Height", default, deserialize_with = "lenient")]
    pub height: Option<u32>,

    /// Video codec name.
    #[serde(rename = "CodecV", default, deserialize_with = "lenient")]
    pub video_codec: Option<String>,

    /// Audio codec name.
    #[serde(rename = "CodecA", default, deserialize_with = "lenient")]
    pub audio_codec: Option<String>,
}

impl Title {
    /// Name shown to the user, falling back to a generated placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use mytv::types::Title;
    ///
    /// let named = Title { id: 7, name: Some("Alien".to_string()), ..Default::default() };
    /// assert_eq!(named.display_name(), "Alien");
    ///
    /// let unnamed = Title { id: 7, ..Default::default() };
    /// assert_eq!(unnamed.display_name(), "Película 7");
    /// ```
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Película {}", self.id),
        }
    }

    /// Server path of this title's poster image.
    pub fn poster_path(&self) -> String {
        format!("/poster/{}", self.id)
    }

    /// Location of this title's playback page.
    pub fn watch_path(&self) -> String {
        format!("/watch/{}", self.id)
    }

    /// Duration formatted as `1h 5m` or `42m`.
    pub fn duration_label(&self) -> String {
        format_duration(self.duration.unwrap_or(0.0))
    }

    /// Resolution formatted as `1920×1080`, or `—` when unknown.
    pub fn resolution_label(&self) -> String {
        format_resolution(self.width, self.height)
    }
}

/// Deserialize an optional field, turning wrong types into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Format a duration in seconds as hours and minutes.
///
/// Negative and non-finite values count as zero.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format a width/height pair, or `—` when either side is unknown.
pub fn format_resolution(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => format!("{}×{}", w, h),
        _ => "—".to_string(),
    }
}

/// Response of the stream resolution endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamDescriptor {
    /// Manifest URL, absolute or relative to the server.
    pub m3u8: String,
}

/// Response of the health endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}
