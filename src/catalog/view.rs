//! Pure projection of the catalog state onto what the screen shows.

use crate::types::Title;

/// Noun used in the stats line.
pub const ITEM_NOUN: &str = "películas";

/// Art drawn in place of a poster that could not be loaded.
pub const POSTER_PLACEHOLDER: &str = "▶ Myt-V";

/// Reference to a title's poster with its fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterRef {
    /// Server path of the poster image.
    pub url: String,
    /// Shown until, or instead of, the real image.
    pub placeholder: &'static str,
}

/// A navigable card for one title.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: u64,
    pub title: String,
    /// Duration and resolution, e.g. `1h 52m • 1920×800`.
    pub subtitle: String,
    pub poster: PosterRef,
    /// Location of the playback page for this title.
    pub href: String,
}

impl Card {
    pub fn from_title(title: &Title) -> Self {
        Self {
            id: title.id,
            title: title.display_name(),
            subtitle: format!("{} • {}", title.duration_label(), title.resolution_label()),
            poster: PosterRef {
                url: title.poster_path(),
                placeholder: POSTER_PLACEHOLDER,
            },
            href: title.watch_path(),
        }
    }
}

/// A fixed, user-facing notice shown instead of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub icon: &'static str,
    pub heading: &'static str,
    pub detail: &'static str,
}

/// Shown when the catalog could not be fetched.
pub const LOAD_ERROR_NOTICE: Notice = Notice {
    icon: "⚠",
    heading: "Error al cargar el catálogo",
    detail: "No se pudo conectar con el servidor.",
};

/// Shown when the current filter matches nothing.
pub const EMPTY_NOTICE: Notice = Notice {
    icon: "🎬",
    heading: "No se encontraron películas",
    detail: "Intenta con otros términos de búsqueda",
};

/// Main area of the catalog view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewBody {
    /// The catalog request has not completed yet.
    Loading,
    /// The catalog request failed; terminal for this session.
    Failed(Notice),
    Empty(Notice),
    Grid(Vec<Card>),
}

/// Pager label and control state.
#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl Pager {
    pub fn new(page: usize, total_pages: usize) -> Self {
        Self {
            page,
            total_pages,
            prev_enabled: page > 1,
            next_enabled: page < total_pages,
        }
    }

    /// Pager with both controls disabled.
    pub fn inert() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            prev_enabled: false,
            next_enabled: false,
        }
    }

    /// `page / total`
    pub fn label(&self) -> String {
        format!("{} / {}", self.page, self.total_pages)
    }
}

/// Everything the catalog screen displays, derived from state.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    pub stats: String,
    pub body: ViewBody,
    pub pager: Pager,
}

/// Stats line, e.g. `30 películas • 1–24`.
///
/// Counts are plain integers with no thousands grouping.
pub fn stats_line(count: usize, start: usize, end: usize) -> String {
    format!("{} {} • {}–{}", count, ITEM_NOUN, start, end)
}
