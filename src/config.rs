//! Configuration file support for mytv.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the media library server
    #[serde(default = "default_server")]
    pub server: String,

    /// Number of cards per catalog page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before a search query is applied, in milliseconds
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Video player command (overrides platform default)
    #[serde(default)]
    pub player: Option<String>,

    /// Additional arguments to pass to the video player
    #[serde(default)]
    pub player_args: Vec<String>,

    /// Force whether the player is treated as HLS-capable.
    /// When unset, known players are detected by name.
    #[serde(default)]
    pub native_hls: Option<bool>,

    /// Allow the built-in HLS loader when the player lacks HLS support
    #[serde(default = "default_true")]
    pub software_hls: bool,

    /// Retry policy for the built-in HLS loader
    #[serde(default)]
    pub hls: HlsRetryConfig,

    /// Key bindings for the catalog view
    #[serde(default)]
    pub keybindings: Keybindings,
}

/// Retry policy applied by the built-in HLS loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HlsRetryConfig {
    #[serde(default = "default_manifest_retry_delay_ms")]
    pub manifest_retry_delay_ms: u64,
    #[serde(default = "default_max_retry")]
    pub manifest_max_retry: u32,
    #[serde(default = "default_max_retry")]
    pub fragment_max_retry: u32,
    #[serde(default = "default_fragment_retry_delay_ms")]
    pub fragment_retry_delay_ms: u64,
}

impl Default for HlsRetryConfig {
    fn default() -> Self {
        Self {
            manifest_retry_delay_ms: default_manifest_retry_delay_ms(),
            manifest_max_retry: default_max_retry(),
            fragment_max_retry: default_max_retry(),
            fragment_retry_delay_ms: default_fragment_retry_delay_ms(),
        }
    }
}

/// Key names accepted per action. Names are single characters or one of
/// `left`, `right`, `up`, `down`, `enter`, `esc`, `tab`, `backspace`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub prev_page: Vec<String>,
    pub next_page: Vec<String>,
    pub focus_search: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub select: Vec<String>,
    pub help: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for Keybindings {
    fn default() -> Self {
        fn keys(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            prev_page: keys(&["left"]),
            next_page: keys(&["right"]),
            focus_search: keys(&["/"]),
            up: keys(&["up", "k"]),
            down: keys(&["down", "j"]),
            select: keys(&["enter"]),
            help: keys(&["?"]),
            quit: keys(&["q"]),
        }
    }
}

impl Keybindings {
    /// Check whether a key event matches any name in `binding`.
    pub fn matches(&self, binding: &[String], key: &KeyEvent) -> bool {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        binding
            .iter()
            .any(|name| parse_key_name(name).is_some_and(|code| code == key.code))
    }
}

fn parse_key_name(name: &str) -> Option<KeyCode> {
    let code = match name.to_lowercase().as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(code)
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_server() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_page_size() -> usize {
    24
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_manifest_retry_delay_ms() -> u64 {
    1000
}

fn default_fragment_retry_delay_ms() -> u64 {
    1000
}

fn default_max_retry() -> u32 {
    10
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            server: default_server(),
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            player: None,
            player_args: Vec::new(),
            native_hls: None,
            software_hls: true,
            hls: HlsRetryConfig::default(),
            keybindings: Keybindings::default(),
        }
    }

    /// Debounce delay as a [`Duration`].
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/mytv/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("mytv");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            Self::new().save_to(&path)?;
        }

        Ok(path)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(crate::error::AppError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.server).map_err(|e| {
            crate::error::AppError::Config(format!("invalid server '{}': {}", self.server, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert_eq!(config.server, "http://127.0.0.1:8080");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.search_debounce_ms, 300);
        assert!(config.player.is_none());
        assert!(config.player_args.is_empty());
        assert!(config.software_hls);
        assert_eq!(config.hls.manifest_retry_delay_ms, 1000);
        assert_eq!(config.hls.manifest_max_retry, 10);
        assert_eq!(config.hls.fragment_max_retry, 10);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            player: Some("vlc".to_string()),
            player_args: vec!["--fullscreen".to_string()],
            ..Config::new()
        };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("server = \"http://127.0.0.1:8080\""));
        assert!(toml_str.contains("page_size = 24"));
        assert!(toml_str.contains("player = \"vlc\""));
        assert!(toml_str.contains("[hls]"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        let toml_str = r#"
            server = "http://nas.local:8080"

            [hls]
            manifest_max_retry = 3
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server, "http://nas.local:8080");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.hls.manifest_max_retry, 3);
        assert_eq!(config.hls.fragment_max_retry, 10);
        assert_eq!(config.keybindings, Keybindings::default());
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.page_size, 24);
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            page_size: 12,
            native_hls: Some(false),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.page_size, 12);
        assert_eq!(loaded.native_hls, Some(false));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_keybinding_matching() {
        let kb = Keybindings::default();
        let left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        let slash = KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE);
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);

        assert!(kb.matches(&kb.prev_page, &left));
        assert!(!kb.matches(&kb.next_page, &left));
        assert!(kb.matches(&kb.focus_search, &slash));
        assert!(!kb.matches(&kb.quit, &ctrl_q));
    }
}
