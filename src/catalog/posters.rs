//! Lazy poster loading for the cards on screen.
//!
//! A failed poster never produces an error for the user: the card simply keeps
//! its placeholder art.

use std::collections::HashMap;

use crate::api::Poster;
use crate::error::Result;

/// Load status of one poster.
#[derive(Debug, Clone, PartialEq)]
pub enum PosterStatus {
    Pending,
    Loaded {
        content_type: Option<String>,
        size: usize,
    },
    /// The poster could not be loaded; draw the placeholder.
    Placeholder,
}

/// Result of one poster request, sent back to the UI loop.
#[derive(Debug)]
pub struct PosterLoaded {
    pub id: u64,
    pub result: Result<Poster>,
}

/// Tracks poster requests per title id.
#[derive(Debug, Default)]
pub struct PosterBoard {
    statuses: HashMap<u64, PosterStatus>,
}

impl PosterBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every id not seen before as pending and return those ids.
    pub fn request(&mut self, ids: impl IntoIterator<Item = u64>) -> Vec<u64> {
        let mut fresh = Vec::new();
        for id in ids {
            if !self.statuses.contains_key(&id) {
                self.statuses.insert(id, PosterStatus::Pending);
                fresh.push(id);
            }
        }
        fresh
    }

    /// Record the outcome of a request.
    pub fn apply(&mut self, loaded: PosterLoaded) {
        let status = match loaded.result {
            Ok(poster) => PosterStatus::Loaded {
                content_type: poster.content_type,
                size: poster.bytes.len(),
            },
            Err(e) => {
                log::debug!("Poster {} unavailable: {}", loaded.id, e);
                PosterStatus::Placeholder
            }
        };
        self.statuses.insert(loaded.id, status);
    }

    pub fn status(&self, id: u64) -> Option<&PosterStatus> {
        self.statuses.get(&id)
    }
}
