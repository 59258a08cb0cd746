//! External video player process used as the media element.

use log::debug;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

use super::strategy::{CanPlayType, Feed, HLS_MIME, MediaElement, MediaSource};
use crate::error::{AppError, Result};

/// Players known to open HLS playlists on their own.
const NATIVE_HLS_PLAYERS: &[&str] = &["mpv", "iina", "vlc", "ffplay", "mplayer", "celluloid"];

/// Search for an executable in the system PATH.
///
/// Handles:
/// - Absolute paths (checked directly)
/// - Relative paths with separators (checked directly)
/// - Windows PATHEXT extensions (.exe, .cmd, .bat)
/// - Standard PATH search
pub fn find_in_path<P: AsRef<Path>>(exe_name: P) -> Option<PathBuf> {
    let exe_path = exe_name.as_ref();

    if exe_path.is_absolute()
        || exe_path
            .to_string_lossy()
            .contains(std::path::MAIN_SEPARATOR)
    {
        if exe_path.is_file() {
            return Some(exe_path.to_path_buf());
        }
        #[cfg(windows)]
        {
            for ext in &[".exe", ".cmd", ".bat", ".com"] {
                let with_ext = exe_path.with_extension(&ext[1..]);
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
        return None;
    }

    env::var_os("PATH").and_then(|paths| {
        #[cfg(windows)]
        let extensions: Vec<String> = env::var("PATHEXT")
            .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string())
            .split(';')
            .map(|s| s.to_lowercase())
            .collect();

        env::split_paths(&paths).find_map(|dir| {
            let full_path = dir.join(exe_path);
            if full_path.is_file() {
                return Some(full_path);
            }

            #[cfg(windows)]
            {
                for ext in &extensions {
                    let with_ext = full_path.with_extension(ext.trim_start_matches('.'));
                    if with_ext.is_file() {
                        return Some(with_ext);
                    }
                }
            }

            None
        })
    })
}

/// Get the default video player for the current operating system.
pub fn default_player() -> Result<&'static str> {
    match env::consts::OS {
        "linux" => Ok("mpv"),
        "windows" => Ok("mpv.exe"),
        "macos" => Ok("iina"),
        other => Err(AppError::Player(format!(
            "OS '{}' has no default player; set one in the config",
            other
        ))),
    }
}

/// Whether a player program is known to play HLS natively.
pub fn detect_native_hls(program: &str) -> bool {
    let stem = Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    NATIVE_HLS_PLAYERS.contains(&stem.as_str())
}

/// A media element backed by an external player process.
pub struct ExternalPlayer {
    program: String,
    args: Vec<String>,
    native_hls: bool,
    src: Option<MediaSource>,
    child: Option<Child>,
    feed: Option<Feed>,
}

impl ExternalPlayer {
    /// `native_hls` overrides the name-based detection when set.
    pub fn new(program: &str, args: &[String], native_hls: Option<bool>) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            native_hls: native_hls.unwrap_or_else(|| detect_native_hls(program)),
            src: None,
            child: None,
            feed: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command line `play` would run for the current source.
    pub fn command_line(&self) -> Result<Vec<String>> {
        let target = match &self.src {
            Some(MediaSource::Url(url)) => url.clone(),
            // Players read the fed stream from stdin.
            Some(MediaSource::Feed) => "-".to_string(),
            None => return Err(AppError::Player("no source set".to_string())),
        };

        let mut line = vec![self.program.clone()];
        line.extend(self.args.iter().cloned());
        line.push(target);
        Ok(line)
    }

    /// Wait for the player process to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| AppError::Player("player was never started".to_string()))?;
        Ok(child.wait().await?)
    }
}

impl std::fmt::Debug for ExternalPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalPlayer")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("native_hls", &self.native_hls)
            .field("src", &self.src)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl MediaElement for ExternalPlayer {
    fn can_play_type(&self, mime: &str) -> CanPlayType {
        if mime == HLS_MIME && self.native_hls {
            CanPlayType::Maybe
        } else {
            CanPlayType::No
        }
    }

    fn set_src(&mut self, src: MediaSource) {
        self.src = Some(src);
    }

    fn play(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let line = self.command_line()?;
        if find_in_path(&self.program).is_none() {
            return Err(AppError::Player(format!(
                "player '{}' not found in PATH",
                self.program
            )));
        }
        let fed = matches!(self.src, Some(MediaSource::Feed));

        // Detach from the terminal session so the TUI keeps the tty.
        let mut cmd = match find_in_path("setsid") {
            Some(setsid) if env::consts::OS == "linux" => {
                let mut cmd = Command::new(setsid);
                cmd.arg(&line[0]);
                cmd
            }
            _ => Command::new(&line[0]),
        };
        cmd.args(&line[1..])
            .stdin(if fed { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        debug!("Starting player: {}", line.join(" "));

        let mut child = cmd
            .spawn()
            .map_err(|e| AppError::Player(format!("failed to start {}: {}", self.program, e)))?;

        if fed {
            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| AppError::Player("player stdin unavailable".to_string()))?;
            self.feed = Some(Box::new(stdin));
        }
        self.child = Some(child);
        Ok(())
    }

    fn take_feed(&mut self) -> Option<Feed> {
        self.feed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_native_hls() {
        assert!(detect_native_hls("mpv"));
        assert!(detect_native_hls("/usr/bin/vlc"));
        assert!(detect_native_hls("mpv.exe"));
        assert!(!detect_native_hls("cat"));
    }

    #[test]
    fn test_override_native_hls() {
        let player = ExternalPlayer::new("mpv", &[], Some(false));
        assert_eq!(player.can_play_type(HLS_MIME), CanPlayType::No);

        let player = ExternalPlayer::new("myplayer", &[], Some(true));
        assert_eq!(player.can_play_type(HLS_MIME), CanPlayType::Maybe);
        assert_eq!(player.can_play_type("video/mp4"), CanPlayType::No);
    }

    #[test]
    fn test_command_line() {
        let mut player = ExternalPlayer::new("mpv", &["--fs".to_string()], None);
        assert!(player.command_line().is_err());

        player.set_src(MediaSource::Url("http://x/a.m3u8?t=1".to_string()));
        assert_eq!(
            player.command_line().unwrap(),
            vec!["mpv", "--fs", "http://x/a.m3u8?t=1"]
        );

        player.set_src(MediaSource::Feed);
        assert_eq!(player.command_line().unwrap(), vec!["mpv", "--fs", "-"]);
    }

    #[test]
    fn test_default_player_on_supported_os() {
        if matches!(env::consts::OS, "linux" | "windows" | "macos") {
            assert!(default_player().is_ok());
        }
    }

    #[test]
    fn test_find_in_path_missing() {
        assert!(find_in_path("definitely-not-a-real-player-binary").is_none());
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_play() {
        let mut player = ExternalPlayer::new("/nonexistent/player", &[], Some(true));
        player.set_src(MediaSource::Url("http://x/a.m3u8".to_string()));
        assert!(matches!(player.play(), Err(AppError::Player(_))));
    }
}
