//! The catalog controller owns the browse state for one session.
//!
//! Every mutation goes through a method here, followed by [`CatalogController::refresh`],
//! which commits the page clamp before anything is sliced or drawn.

use log::{debug, warn};

use super::browse::{BrowseState, paginate};
use super::view::{
    Card, CatalogView, EMPTY_NOTICE, LOAD_ERROR_NOTICE, Pager, ViewBody, stats_line,
};
use crate::error::Result;
use crate::types::Title;

/// Progress of the one-shot catalog load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The load failed with this message. Nothing recovers from here.
    Failed(String),
}

/// Catalog state plus its load status.
#[derive(Debug, Clone)]
pub struct CatalogController {
    state: BrowseState,
    load: LoadState,
}

impl CatalogController {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: BrowseState::new(page_size),
            load: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &BrowseState {
        &self.state
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// Store the outcome of the catalog fetch.
    pub fn apply_load(&mut self, result: Result<Vec<Title>>) {
        match result {
            Ok(titles) => {
                debug!("Catalog loaded with {} titles", titles.len());
                self.state.replace_titles(titles);
                self.load = LoadState::Ready;
            }
            Err(e) => {
                warn!("Error loading catalog: {}", e);
                self.state.replace_titles(Vec::new());
                self.load = LoadState::Failed(e.to_string());
            }
        }
        self.refresh();
    }

    /// Apply a (debounced) search query and go back to page 1.
    ///
    /// Returns false when the catalog failed to load; the query is dropped.
    pub fn apply_query(&mut self, query: &str) -> bool {
        if matches!(self.load, LoadState::Failed(_)) {
            debug!("Ignoring query '{}' after failed load", query);
            return false;
        }
        self.state.set_query(query);
        self.refresh();
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.state.set_page_size(page_size);
        self.refresh();
    }

    /// Go to the next page if the next control is enabled.
    pub fn next_page(&mut self) -> bool {
        if !self.pager().next_enabled {
            return false;
        }
        self.state.commit_page(self.state.page() + 1);
        true
    }

    /// Go to the previous page if the previous control is enabled.
    pub fn prev_page(&mut self) -> bool {
        if !self.pager().prev_enabled {
            return false;
        }
        self.state.commit_page(self.state.page() - 1);
        true
    }

    /// Commit the page clamp for the current filter.
    pub fn refresh(&mut self) {
        self.state.commit_page(self.state.page());
    }

    /// Refresh, then project the state.
    pub fn render(&mut self) -> CatalogView {
        self.refresh();
        self.view()
    }

    /// Pager for the current state.
    pub fn pager(&self) -> Pager {
        if self.load != LoadState::Ready {
            return Pager::inert();
        }
        let filtered = self.state.filtered();
        let slice = paginate(&filtered, self.state.page(), self.state.page_size());
        Pager::new(slice.page, slice.total_pages)
    }

    /// Project the committed state onto a [`CatalogView`].
    pub fn view(&self) -> CatalogView {
        match &self.load {
            LoadState::Loading => CatalogView {
                stats: String::new(),
                body: ViewBody::Loading,
                pager: Pager::inert(),
            },
            LoadState::Failed(_) => CatalogView {
                stats: String::new(),
                body: ViewBody::Failed(LOAD_ERROR_NOTICE),
                pager: Pager::inert(),
            },
            LoadState::Ready => {
                let filtered = self.state.filtered();
                let slice = paginate(&filtered, self.state.page(), self.state.page_size());
                let (start, end) = slice.bounds();

                let body = if slice.items.is_empty() {
                    ViewBody::Empty(EMPTY_NOTICE)
                } else {
                    ViewBody::Grid(slice.items.iter().map(|t| Card::from_title(t)).collect())
                };

                CatalogView {
                    stats: stats_line(filtered.len(), start, end),
                    body,
                    pager: Pager::new(slice.page, slice.total_pages),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn titles(n: u64) -> Vec<Title> {
        (1..=n)
            .map(|id| Title {
                id,
                name: Some(format!("Movie {:02}", id)),
                ..Default::default()
            })
            .collect()
    }

    fn grid_len(view: &CatalogView) -> usize {
        match &view.body {
            ViewBody::Grid(cards) => cards.len(),
            _ => 0,
        }
    }

    #[test]
    fn test_loading_view_before_load() {
        let mut catalog = CatalogController::new(24);
        let view = catalog.render();
        assert_eq!(view.body, ViewBody::Loading);
        assert!(!view.pager.prev_enabled && !view.pager.next_enabled);
    }

    #[test]
    fn test_thirty_titles_two_pages() {
        let mut catalog = CatalogController::new(24);
        catalog.apply_load(Ok(titles(30)));

        let view = catalog.render();
        assert_eq!(grid_len(&view), 24);
        assert_eq!(view.stats, "30 películas • 1–24");
        assert!(view.pager.next_enabled);
        assert!(!view.pager.prev_enabled);
        assert_eq!(view.pager.label(), "1 / 2");

        assert!(catalog.next_page());
        let view = catalog.render();
        assert_eq!(grid_len(&view), 6);
        assert_eq!(view.stats, "30 películas • 25–30");
        assert!(!view.pager.next_enabled);
        assert!(view.pager.prev_enabled);

        assert!(!catalog.next_page());
        assert_eq!(catalog.state().page(), 2);
    }

    #[test]
    fn test_prev_is_guarded_on_first_page() {
        let mut catalog = CatalogController::new(24);
        catalog.apply_load(Ok(titles(30)));
        assert!(!catalog.prev_page());
        assert_eq!(catalog.state().page(), 1);
    }

    #[test]
    fn test_narrowing_query_clamps_page() {
        let mut catalog = CatalogController::new(24);
        let mut all = titles(30);
        for t in all.iter_mut().take(3) {
            t.name = Some(format!("Star {}", t.id));
        }
        catalog.apply_load(Ok(all));
        assert!(catalog.next_page());
        assert_eq!(catalog.state().page(), 2);

        assert!(catalog.apply_query("star"));
        let view = catalog.render();
        assert_eq!(catalog.state().page(), 1);
        assert_eq!(view.pager.total_pages, 1);
        assert_eq!(grid_len(&view), 3);
        assert_eq!(view.stats, "3 películas • 1–3");
    }

    #[test]
    fn test_page_size_change_clamps_page() {
        let mut catalog = CatalogController::new(5);
        catalog.apply_load(Ok(titles(30)));
        for _ in 0..5 {
            catalog.next_page();
        }
        assert_eq!(catalog.state().page(), 6);

        catalog.set_page_size(24);
        assert_eq!(catalog.state().page(), 2);
    }

    #[test]
    fn test_no_matches_renders_empty_notice() {
        let mut catalog = CatalogController::new(24);
        catalog.apply_load(Ok(titles(4)));
        catalog.apply_query("zzz");
        let view = catalog.render();
        assert_eq!(view.body, ViewBody::Empty(EMPTY_NOTICE));
        assert_eq!(view.stats, "0 películas • 0–0");
        assert_eq!(view.pager.label(), "1 / 1");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut catalog = CatalogController::new(24);
        catalog.apply_load(Ok(titles(30)));
        catalog.next_page();
        let first = catalog.render();
        let second = catalog.render();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_load_is_terminal() {
        let mut catalog = CatalogController::new(24);
        catalog.apply_load(Err(AppError::Http {
            status: 500,
            url: "http://127.0.0.1:8080/catalog".to_string(),
        }));

        let view = catalog.render();
        assert_eq!(view.body, ViewBody::Failed(LOAD_ERROR_NOTICE));
        assert!(matches!(catalog.load_state(), LoadState::Failed(_)));

        assert!(!catalog.apply_query("anything"));
        assert_eq!(catalog.render(), view);
        assert!(!catalog.next_page());
    }
}
