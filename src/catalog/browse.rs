//! Browse state: the fetched collection, the search query and the page counter.
//!
//! All derivation (filter, paginate) is pure; the only place the page counter
//! changes is [`BrowseState::commit_page`], so the clamp rule is enforced at
//! one boundary.

use crate::types::Title;

/// Titles whose name contains `query`, case-insensitively.
///
/// A blank query keeps every title. A title without a name never matches a
/// non-empty query. Order is always the received order.
///
/// # Examples
///
/// ```
/// use mytv::catalog::filter_titles;
/// use mytv::types::Title;
///
/// let titles = vec![
///     Title { id: 1, name: Some("The Thing".into()), ..Default::default() },
///     Title { id: 2, name: Some("Alien".into()), ..Default::default() },
/// ];
/// assert_eq!(filter_titles(&titles, "  THING ").len(), 1);
/// assert_eq!(filter_titles(&titles, "").len(), 2);
/// ```
pub fn filter_titles<'a>(titles: &'a [Title], query: &str) -> Vec<&'a Title> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return titles.iter().collect();
    }
    titles
        .iter()
        .filter(|t| {
            t.name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}

/// Number of pages for `len` items, never less than one.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Clamp a requested 1-based page into `[1, total_pages(len, page_size)]`.
pub fn clamp_page(requested: usize, len: usize, page_size: usize) -> usize {
    requested.clamp(1, total_pages(len, page_size))
}

/// One page of a filtered list.
#[derive(Debug, PartialEq)]
pub struct PageSlice<'a, T> {
    /// The clamped 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    /// Index of the first item of this page within the filtered list.
    pub offset: usize,
    pub items: &'a [T],
}

impl<T> PageSlice<'_, T> {
    /// 1-based inclusive bounds of the slice, `(0, 0)` when it is empty.
    pub fn bounds(&self) -> (usize, usize) {
        if self.items.is_empty() {
            (0, 0)
        } else {
            (self.offset + 1, self.offset + self.items.len())
        }
    }
}

/// Slice `items` for `requested` page after clamping it.
pub fn paginate<T>(items: &[T], requested: usize, page_size: usize) -> PageSlice<'_, T> {
    let page_size = page_size.max(1);
    let pages = total_pages(items.len(), page_size);
    let page = requested.clamp(1, pages);
    let offset = (page - 1) * page_size;
    let end = (offset + page_size).min(items.len());

    PageSlice {
        page,
        total_pages: pages,
        offset,
        items: items.get(offset..end).unwrap_or(&[]),
    }
}

/// In-memory browse state for one catalog session.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    titles: Vec<Title>,
    query: String,
    page: usize,
    page_size: usize,
}

impl BrowseState {
    /// Empty state with a fixed page size.
    pub fn new(page_size: usize) -> Self {
        Self {
            titles: Vec::new(),
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the whole collection with a fresh snapshot.
    pub fn replace_titles(&mut self, titles: Vec<Title>) {
        self.titles = titles;
    }

    /// Apply a search query; a new query always starts from page 1.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Titles matching the current query.
    pub fn filtered(&self) -> Vec<&Title> {
        filter_titles(&self.titles, &self.query)
    }

    /// The clamped value of `requested` for the current filter.
    pub fn clamped(&self, requested: usize) -> usize {
        clamp_page(requested, self.filtered().len(), self.page_size)
    }

    /// Store `requested` as the current page, clamped into range.
    pub fn commit_page(&mut self, requested: usize) {
        self.page = self.clamped(requested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(n: u64) -> Vec<Title> {
        (1..=n)
            .map(|id| Title {
                id,
                name: Some(format!("Movie {}", id)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_filter_blank_query_returns_everything_in_order() {
        let all = titles(5);
        let filtered = filter_titles(&all, "   ");
        let ids: Vec<u64> = filtered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut all = titles(3);
        all[1].name = Some("BLADE Runner".to_string());
        let filtered = filter_titles(&all, "blade r");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
    }

    #[test]
    fn test_filter_skips_nameless_titles() {
        let all = vec![
            Title {
                id: 12,
                ..Default::default()
            },
            Title {
                id: 3,
                name: Some("Heat".into()),
                ..Default::default()
            },
        ];
        assert!(filter_titles(&all, "1").is_empty());
        assert!(filter_titles(&all, "película").is_empty());
        assert_eq!(filter_titles(&all, "heat")[0].id, 3);
        assert_eq!(filter_titles(&all, "  ").len(), 2);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 24), 1);
        assert_eq!(total_pages(24, 24), 1);
        assert_eq!(total_pages(25, 24), 2);
        assert_eq!(total_pages(30, 24), 2);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 30, 24), 1);
        assert_eq!(clamp_page(5, 30, 24), 2);
        assert_eq!(clamp_page(2, 0, 24), 1);
    }

    #[test]
    fn test_paginate_slices() {
        let items: Vec<u32> = (0..30).collect();
        let first = paginate(&items, 1, 24);
        assert_eq!(first.items.len(), 24);
        assert_eq!(first.bounds(), (1, 24));
        assert_eq!(first.total_pages, 2);

        let second = paginate(&items, 2, 24);
        assert_eq!(second.items.len(), 6);
        assert_eq!(second.bounds(), (25, 30));
    }

    #[test]
    fn test_paginate_length_property() {
        for len in 0..60usize {
            let items: Vec<usize> = (0..len).collect();
            for size in 1..8usize {
                for requested in 0..12usize {
                    let slice = paginate(&items, requested, size);
                    let pages = total_pages(len, size);
                    assert!(slice.page >= 1 && slice.page <= pages);
                    assert_eq!(slice.total_pages, pages);
                    let expected = size.min(len.saturating_sub((slice.page - 1) * size));
                    assert_eq!(slice.items.len(), expected);
                }
            }
        }
    }

    #[test]
    fn test_paginate_empty() {
        let items: Vec<u32> = Vec::new();
        let slice = paginate(&items, 3, 24);
        assert_eq!(slice.page, 1);
        assert!(slice.items.is_empty());
        assert_eq!(slice.bounds(), (0, 0));
    }

    #[test]
    fn test_set_query_resets_page() {
        let mut state = BrowseState::new(24);
        state.replace_titles(titles(30));
        state.commit_page(2);
        assert_eq!(state.page(), 2);
        state.set_query("Movie 1");
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_commit_page_clamps() {
        let mut state = BrowseState::new(10);
        state.replace_titles(titles(25));
        state.commit_page(9);
        assert_eq!(state.page(), 3);
        state.commit_page(0);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let state = BrowseState::new(0);
        assert_eq!(state.page_size(), 1);
    }
}
