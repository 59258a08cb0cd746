//! Catalog browsing: filtering, pagination and the view projection.
//!
//! The catalog is fetched once; everything after that is derived locally from
//! that snapshot by [`CatalogController`].

mod browse;
mod controller;
mod debounce;
mod posters;
mod view;

pub use browse::{BrowseState, PageSlice, clamp_page, filter_titles, paginate, total_pages};
pub use controller::{CatalogController, LoadState};
pub use debounce::{Debouncer, Fired};
pub use posters::{PosterBoard, PosterLoaded, PosterStatus};
pub use view::{
    Card, CatalogView, EMPTY_NOTICE, ITEM_NOUN, LOAD_ERROR_NOTICE, Notice, POSTER_PLACEHOLDER,
    Pager, PosterRef, ViewBody, stats_line,
};
