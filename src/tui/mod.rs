//! Terminal user interface for the catalog using ratatui.
//!
//! One full-screen view: header with stats, search bar, card grid and pager.
//! Choosing a card switches to the playback screen while the player runs.

mod render;
mod state;
mod types;

pub use render::draw;
pub use state::App;
pub use types::{Action, NowPlaying, Screen};

use crossterm::event::{self, Event};
use std::io;
use std::time::Duration;

/// Poll for keyboard events with a timeout.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
