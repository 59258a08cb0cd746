//! A terminal client for a personal Myt-V media server.
//!
//! mytv browses the server's movie catalog with live search and pagination,
//! and plays titles through an external video player. Players that cannot
//! open HLS playlists themselves are fed by a built-in software loader.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog of the default server
//! cargo run
//!
//! # Play one title straight away
//! cargo run -- --server http://nas:8080 watch /watch/12
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod playback;
pub mod tui;
pub mod types;
