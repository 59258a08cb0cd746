//! Main entry point for the mytv terminal client.

use clap::{Parser, Subcommand};
use crossterm::{
    event::Event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use mytv::api::ApiClient;
use mytv::catalog::PosterLoaded;
use mytv::config::Config;
use mytv::error::{AppError, Result};
use mytv::playback::{
    ExternalPlayer, HlsConfig, PlaybackSession, SoftwareHls, bootstrap, default_player,
    feed_element, find_in_path, now_millis, resolve_stream,
};
use mytv::tui::{Action, App, draw, poll_event};
use mytv::types::Title;
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

/// Command-line arguments for mytv.
#[derive(Parser, Debug)]
#[command(
    name = "mytv",
    version,
    about = "Terminal client for a Myt-V media server",
    long_about = "Browse a Myt-V movie catalog with live search and play titles through an external video player."
)]
struct Args {
    /// Server base URL (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Video player to use (overrides config and platform default)
    #[arg(short, long)]
    player: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the catalog (default)
    Browse,
    /// Play one title, e.g. `/watch/12` or `12`
    Watch { location: String },
    /// Check that the server is up
    Status,
    /// Write the default config file if missing and print its path
    Config,
}

/// Everything needed to start a player for one title.
#[derive(Debug, Clone)]
struct PlayerSettings {
    program: String,
    args: Vec<String>,
    native_hls: Option<bool>,
    software_hls: bool,
    hls: HlsConfig,
}

/// Messages from background tasks to the UI loop.
enum Message {
    Catalog(Result<Vec<Title>>),
    Poster(PosterLoaded),
    PlaybackStarted(u64, &'static str),
    PlaybackFinished(u64),
    PlaybackFailed(u64, String),
}

/// The running playback task, tagged so late messages from an older task are ignored.
#[derive(Default)]
struct PlaybackSlot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackSlot {
    /// Abort any running task and hand out the id for the next one.
    fn next(&mut self) -> u64 {
        self.stop();
        self.generation += 1;
        self.generation
    }

    fn set(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    fn is_current(&self, id: u64) -> bool {
        id == self.generation && self.handle.is_some()
    }

    /// Forget the task once it reported that it ended.
    fn finish(&mut self, id: u64) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.handle = None;
        true
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Pick the player: CLI flag, then config, then the platform default.
fn resolve_player(args: &Args, config: &Config) -> Result<String> {
    let player = match (&args.player, &config.player) {
        (Some(cli_player), _) => cli_player.clone(),
        (None, Some(config_player)) => config_player.clone(),
        (None, None) => default_player()?.to_string(),
    };

    if find_in_path(&player).is_none() {
        return Err(AppError::Player(format!("{} not found in PATH", player)));
    }
    Ok(player)
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if let Some(Commands::Config) = &args.command {
        match Config::create_default_if_missing() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });
    if let Some(server) = &args.server {
        config.server = server.clone();
    }

    let api = match ApiClient::new(&config.server) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: invalid server URL '{}': {}", config.server, e);
            std::process::exit(1);
        }
    };

    if let Some(Commands::Status) = &args.command {
        match api.health().await {
            Ok(health) => println!("{}: {}", api.base_url(), health.status),
            Err(e) => {
                eprintln!("Error: {}: {}", api.base_url(), e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let player = match resolve_player(&args, &config) {
        Ok(player) => player,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Using video player: {}", player);

    let settings = PlayerSettings {
        program: player,
        args: config.player_args.clone(),
        native_hls: config.native_hls,
        software_hls: config.software_hls,
        hls: HlsConfig::from(&config.hls),
    };

    if let Some(Commands::Watch { location }) = &args.command {
        let result = play_title(&api, &settings, location, |session| {
            eprintln!(
                "Playing title {} via {}",
                session.title_id,
                session.strategy.label()
            );
        })
        .await;
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut terminal = init_terminal()?;
    let result = run_app(&mut terminal, &api, &config, &settings).await;
    restore_terminal()?;

    result
}

/// Resolve, bootstrap and drive one title until the player exits.
async fn play_title<F>(
    api: &ApiClient,
    settings: &PlayerSettings,
    location: &str,
    on_start: F,
) -> Result<()>
where
    F: FnOnce(&PlaybackSession),
{
    let stream = resolve_stream(api, location, now_millis()).await?;
    let mut element = ExternalPlayer::new(&settings.program, &settings.args, settings.native_hls);
    let runtime = SoftwareHls::new(api.clone(), settings.software_hls);

    let started = bootstrap(&stream, &mut element, &runtime, &settings.hls).await?;
    on_start(&started.session);

    if let Some(mut player) = started.player {
        feed_element(&mut player, &mut element).await?;
    }

    let status = element.wait().await?;
    debug!("Player exited with {}", status);
    Ok(())
}

fn spawn_playback(
    api: &ApiClient,
    settings: &PlayerSettings,
    href: String,
    id: u64,
    tx: UnboundedSender<Message>,
) -> JoinHandle<()> {
    let api = api.clone();
    let settings = settings.clone();
    tokio::spawn(async move {
        let started_tx = tx.clone();
        let result = play_title(&api, &settings, &href, move |session| {
            let _ = started_tx.send(Message::PlaybackStarted(id, session.strategy.label()));
        })
        .await;

        let message = match result {
            Ok(()) => Message::PlaybackFinished(id),
            Err(e) => {
                warn!("Playback of {} failed: {}", href, e);
                Message::PlaybackFailed(id, e.to_string())
            }
        };
        let _ = tx.send(message);
    })
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    api: &ApiClient,
    config: &Config,
    settings: &PlayerSettings,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (mut app, mut debounce_rx) = App::new(
        config.page_size,
        config.search_debounce(),
        config.keybindings.clone(),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut playback = PlaybackSlot::default();

    // The catalog is fetched once per session
    {
        let api = api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Message::Catalog(api.fetch_catalog().await));
        });
    }

    loop {
        while let Ok(fired) = debounce_rx.try_recv() {
            app.on_debounce(fired);
        }

        while let Ok(message) = rx.try_recv() {
            match message {
                Message::Catalog(result) => app.set_catalog(result),
                Message::Poster(loaded) => app.on_poster(loaded),
                Message::PlaybackStarted(id, strategy) => {
                    if playback.is_current(id) {
                        app.playback_status(Some(strategy), "Reproduciendo");
                    }
                }
                Message::PlaybackFinished(id) => {
                    if playback.finish(id) {
                        app.stop_playback();
                    }
                }
                Message::PlaybackFailed(id, error) => {
                    if playback.finish(id) {
                        app.stop_playback();
                        app.set_error(&error);
                    } else {
                        debug!("Ignoring failure of stale playback {}: {}", id, error);
                    }
                }
            }
        }

        for id in app.pending_posters() {
            let api = api.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_poster(id).await;
                let _ = tx.send(Message::Poster(PosterLoaded { id, result }));
            });
        }

        terminal.draw(|f| draw(f, &mut app))?;

        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(100))? {
            match app.handle_input(key) {
                Action::Quit => break,
                Action::Watch { title, href } => {
                    let id = playback.next();
                    app.start_playback(&title, &href);
                    playback.set(spawn_playback(api, settings, href, id, tx.clone()));
                }
                Action::StopPlayback => playback.stop(),
                Action::None => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    playback.stop();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn test_stale_playback_messages_are_ignored() {
        let mut slot = PlaybackSlot::default();
        let first = slot.next();
        slot.set(idle());

        // Esc, then Enter on another title before the first task's message arrives
        slot.stop();
        let second = slot.next();
        slot.set(idle());

        assert!(!slot.is_current(first));
        assert!(!slot.finish(first));
        assert!(slot.is_current(second));
        assert!(slot.finish(second));
        assert!(!slot.finish(second));
    }

    #[tokio::test]
    async fn test_stop_detaches_current_playback() {
        let mut slot = PlaybackSlot::default();
        let id = slot.next();
        slot.set(idle());
        slot.stop();
        assert!(!slot.is_current(id));
        assert!(!slot.finish(id));
    }
}
