//! TUI type definitions for screens and actions.

/// The current screen of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Catalog grid with search and pager
    Catalog,
    /// A title was handed to the player
    Playback,
}

/// What the catalog knows about the title being played.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    pub href: String,
    /// Strategy label once the bootstrap has picked one
    pub strategy: Option<String>,
    /// Last progress message from the bootstrap or the fragment feed
    pub status: String,
}

/// Actions that can be returned from the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Open the playback page for a card
    Watch { title: String, href: String },
    /// Leave the playback screen and stop feeding the player
    StopPlayback,
}
