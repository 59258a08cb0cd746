//! Application state management and input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::catalog::{
    Card, CatalogController, CatalogView, Debouncer, Fired, PosterBoard, PosterLoaded, ViewBody,
};
use crate::config::Keybindings;
use crate::error::Result;
use crate::types::Title;

use super::types::{Action, NowPlaying, Screen};

/// Application state for the TUI.
pub struct App {
    /// Current screen being displayed
    pub screen: Screen,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Text typed into the search bar
    pub search_input: String,
    /// Whether search bar is focused
    pub search_focused: bool,
    /// Index of the selected card on the current page
    pub selected: usize,
    /// Whether help modal is shown
    pub show_help: bool,
    /// Error message to display
    pub error_message: Option<String>,
    /// Title handed to the player, if any
    pub now_playing: Option<NowPlaying>,
    /// Custom keybindings
    pub keybindings: Keybindings,
    /// Poster load status per title
    pub posters: PosterBoard,
    catalog: CatalogController,
    debouncer: Debouncer<String>,
}

impl App {
    /// Create the app and the receiver its search debounce reports on.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        page_size: usize,
        search_debounce: Duration,
        keybindings: Keybindings,
    ) -> (Self, UnboundedReceiver<Fired<String>>) {
        let (debouncer, rx) = Debouncer::new(search_debounce);
        let app = Self {
            screen: Screen::Catalog,
            should_quit: false,
            search_input: String::new(),
            search_focused: false,
            selected: 0,
            show_help: false,
            error_message: None,
            now_playing: None,
            keybindings,
            posters: PosterBoard::new(),
            catalog: CatalogController::new(page_size),
            debouncer,
        };
        (app, rx)
    }

    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    /// Store the catalog fetch result.
    pub fn set_catalog(&mut self, result: Result<Vec<Title>>) {
        self.catalog.apply_load(result);
        self.selected = 0;
    }

    /// Apply a debounce report; stale reports are dropped.
    pub fn on_debounce(&mut self, fired: Fired<String>) {
        if let Some(query) = self.debouncer.accept(fired) {
            debug!("Applying search '{}'", query);
            if self.catalog.apply_query(&query) {
                self.selected = 0;
            }
        }
    }

    pub fn on_poster(&mut self, loaded: PosterLoaded) {
        self.posters.apply(loaded);
    }

    /// Current view, with the page clamp committed.
    pub fn view(&mut self) -> CatalogView {
        let view = self.catalog.render();
        let cards = match &view.body {
            ViewBody::Grid(cards) => cards.len(),
            _ => 0,
        };
        if self.selected >= cards {
            self.selected = cards.saturating_sub(1);
        }
        view
    }

    /// Cards on the current page.
    pub fn cards(&mut self) -> Vec<Card> {
        match self.view().body {
            ViewBody::Grid(cards) => cards,
            _ => Vec::new(),
        }
    }

    /// Ids of visible posters that have not been requested yet.
    pub fn pending_posters(&mut self) -> Vec<u64> {
        let ids: Vec<u64> = self.cards().iter().map(|c| c.id).collect();
        self.posters.request(ids)
    }

    pub fn start_playback(&mut self, title: &str, href: &str) {
        self.now_playing = Some(NowPlaying {
            title: title.to_string(),
            href: href.to_string(),
            strategy: None,
            status: "Resolviendo stream...".to_string(),
        });
        self.screen = Screen::Playback;
    }

    /// Update the playback status line.
    pub fn playback_status(&mut self, strategy: Option<&str>, status: &str) {
        if let Some(playing) = &mut self.now_playing {
            if let Some(strategy) = strategy {
                playing.strategy = Some(strategy.to_string());
            }
            playing.status = status.to_string();
        }
    }

    pub fn stop_playback(&mut self) {
        self.now_playing = None;
        self.screen = Screen::Catalog;
    }

    /// Set an error message.
    pub fn set_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }

    /// Clear error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Action::Quit;
                }
                _ => {}
            }
        }

        // Any key dismisses the error popup
        if self.error_message.is_some() {
            self.clear_error();
            return Action::None;
        }

        if self.show_help {
            if key.code == KeyCode::Esc
                || self.keybindings.matches(&self.keybindings.help, &key)
                || self.keybindings.matches(&self.keybindings.quit, &key)
            {
                self.show_help = false;
            }
            return Action::None;
        }

        // Typed characters belong to the search field while it has focus
        if self.search_focused {
            return self.handle_search_bar_input(key);
        }

        if self.keybindings.matches(&self.keybindings.help, &key) {
            self.show_help = true;
            return Action::None;
        }

        match self.screen {
            Screen::Catalog => self.handle_catalog_input(key),
            Screen::Playback => self.handle_playback_input(key),
        }
    }

    fn handle_search_bar_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.search_focused = false;
                Action::None
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.debouncer.schedule(self.search_input.clone());
                Action::None
            }
            KeyCode::Backspace => {
                if self.search_input.pop().is_some() {
                    self.debouncer.schedule(self.search_input.clone());
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_catalog_input(&mut self, key: KeyEvent) -> Action {
        if self.keybindings.matches(&self.keybindings.focus_search, &key) {
            self.search_focused = true;
            Action::None
        } else if self.keybindings.matches(&self.keybindings.prev_page, &key) {
            if self.catalog.prev_page() {
                self.selected = 0;
            }
            Action::None
        } else if self.keybindings.matches(&self.keybindings.next_page, &key) {
            if self.catalog.next_page() {
                self.selected = 0;
            }
            Action::None
        } else if self.keybindings.matches(&self.keybindings.up, &key) {
            self.selected = self.selected.saturating_sub(1);
            Action::None
        } else if self.keybindings.matches(&self.keybindings.down, &key) {
            let count = self.cards().len();
            if self.selected + 1 < count {
                self.selected += 1;
            }
            Action::None
        } else if self.keybindings.matches(&self.keybindings.select, &key) {
            let selected = self.selected;
            match self.cards().into_iter().nth(selected) {
                Some(card) => Action::Watch {
                    title: card.title,
                    href: card.href,
                },
                None => Action::None,
            }
        } else if self.keybindings.matches(&self.keybindings.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            Action::None
        }
    }

    fn handle_playback_input(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc || self.keybindings.matches(&self.keybindings.quit, &key) {
            self.stop_playback();
            Action::StopPlayback
        } else {
            Action::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn titles(n: u64) -> Vec<Title> {
        (1..=n)
            .map(|id| Title {
                id,
                name: Some(if id % 2 == 0 {
                    format!("Batman {}", id)
                } else {
                    format!("Alien {}", id)
                }),
                ..Default::default()
            })
            .collect()
    }

    fn app() -> (App, UnboundedReceiver<Fired<String>>) {
        App::new(24, Duration::from_millis(300), Keybindings::default())
    }

    #[tokio::test]
    async fn test_arrows_page_and_reset_selection() {
        let (mut app, _rx) = app();
        app.set_catalog(Ok(titles(30)));

        app.handle_input(key(KeyCode::Down));
        app.handle_input(key(KeyCode::Down));
        assert_eq!(app.selected, 2);

        app.handle_input(key(KeyCode::Right));
        assert_eq!(app.catalog().state().page(), 2);
        assert_eq!(app.selected, 0);
        assert_eq!(app.cards().len(), 6);

        // Already on the last page
        app.handle_input(key(KeyCode::Right));
        assert_eq!(app.catalog().state().page(), 2);

        app.handle_input(key(KeyCode::Left));
        assert_eq!(app.catalog().state().page(), 1);
    }

    #[tokio::test]
    async fn test_arrows_type_into_focused_search() {
        let (mut app, _rx) = app();
        app.set_catalog(Ok(titles(30)));

        app.handle_input(key(KeyCode::Char('/')));
        assert!(app.search_focused);

        app.handle_input(key(KeyCode::Right));
        assert_eq!(app.catalog().state().page(), 1);

        app.handle_input(key(KeyCode::Char('q')));
        app.handle_input(key(KeyCode::Char('/')));
        assert!(!app.should_quit);
        assert_eq!(app.search_input, "q/");

        app.handle_input(key(KeyCode::Esc));
        assert!(!app.search_focused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_applies_after_debounce() {
        let (mut app, mut rx) = app();
        app.set_catalog(Ok(titles(30)));
        app.handle_input(key(KeyCode::Right));

        app.handle_input(key(KeyCode::Char('/')));
        for c in "bat".chars() {
            app.handle_input(key(KeyCode::Char(c)));
        }
        // Nothing applied until the timer fires
        assert_eq!(app.catalog().state().query(), "");

        tokio::time::sleep(Duration::from_millis(301)).await;
        while let Ok(fired) = rx.try_recv() {
            app.on_debounce(fired);
        }

        assert_eq!(app.catalog().state().query(), "bat");
        assert_eq!(app.catalog().state().page(), 1);
        assert_eq!(app.cards().len(), 15);
    }

    #[tokio::test]
    async fn test_enter_watches_selected_card() {
        let (mut app, _rx) = app();
        app.set_catalog(Ok(titles(3)));
        app.handle_input(key(KeyCode::Char('j')));

        let action = app.handle_input(key(KeyCode::Enter));
        assert_eq!(
            action,
            Action::Watch {
                title: "Batman 2".to_string(),
                href: "/watch/2".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_enter_on_failed_catalog_does_nothing() {
        let (mut app, _rx) = app();
        app.set_catalog(Err(AppError::Http {
            status: 500,
            url: "http://x/catalog".to_string(),
        }));
        assert_eq!(app.handle_input(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.handle_input(key(KeyCode::Right)), Action::None);
    }

    #[tokio::test]
    async fn test_help_and_error_popups_swallow_keys() {
        let (mut app, _rx) = app();
        app.set_catalog(Ok(titles(30)));

        app.handle_input(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_input(key(KeyCode::Right));
        assert_eq!(app.catalog().state().page(), 1);
        app.handle_input(key(KeyCode::Esc));
        assert!(!app.show_help);

        app.set_error("boom");
        app.handle_input(key(KeyCode::Char('q')));
        assert!(app.error_message.is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_playback_screen_stops_on_esc() {
        let (mut app, _rx) = app();
        app.start_playback("Alien 1", "/watch/1");
        app.playback_status(Some("native HLS"), "Reproduciendo");
        assert_eq!(app.screen, Screen::Playback);
        assert_eq!(
            app.now_playing.as_ref().unwrap().strategy.as_deref(),
            Some("native HLS")
        );

        assert_eq!(app.handle_input(key(KeyCode::Esc)), Action::StopPlayback);
        assert_eq!(app.screen, Screen::Catalog);
        assert!(app.now_playing.is_none());
    }

    #[tokio::test]
    async fn test_pending_posters_once_per_title() {
        let (mut app, _rx) = app();
        app.set_catalog(Ok(titles(30)));
        assert_eq!(app.pending_posters().len(), 24);
        assert!(app.pending_posters().is_empty());
        app.handle_input(key(KeyCode::Right));
        assert_eq!(app.pending_posters(), vec![25, 26, 27, 28, 29, 30]);
    }
}
