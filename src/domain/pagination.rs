//! Client-side pagination over an already-fetched list.
//!
//! Responsibility:
//! - total page count (never below 1) and clipped slice bounds for a page
//! - the page-number window rendered by the pagination control
//!
//! There is no server-side paging: every slice is taken from whatever list
//! the last browse operation produced.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Current page (1-based) and the constant page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        total_pages(item_count, self.page_size)
    }

    pub fn bounds(&self, item_count: usize) -> Range<usize> {
        page_bounds(self.current_page, self.page_size, item_count)
    }
}

/// `ceil(item_count / page_size)`, minimum 1.
pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    item_count.div_ceil(page_size.max(1)).max(1)
}

/// Half-open index range of `page` clipped to `len`.
pub fn page_bounds(page: usize, page_size: usize, len: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

/// Slice of `items` shown on `page`.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    &items[page_bounds(page, page_size, items.len())]
}

/// One entry of the pagination control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "page", rename_all = "camelCase")]
#[ts(export)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Page-number window: first page, current page with its neighbours, last
/// page, and an ellipsis wherever numbers are skipped.
pub fn page_links(current: usize, total: usize) -> Vec<PageLink> {
    let total = total.max(1);
    let current = current.clamp(1, total);

    let mut links = vec![PageLink::Page(1)];
    if total == 1 {
        return links;
    }

    let window_start = current.saturating_sub(1).max(2);
    let window_end = (current + 1).min(total - 1);

    if window_start > 2 {
        links.push(PageLink::Ellipsis);
    }
    for page in window_start..=window_end {
        links.push(PageLink::Page(page));
    }
    if window_end < total - 1 {
        links.push(PageLink::Ellipsis);
    }

    links.push(PageLink::Page(total));
    links
}

pub fn has_previous(current: usize) -> bool {
    current > 1
}

pub fn has_next(current: usize, total: usize) -> bool {
    current < total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(9, 1)]
    #[case(10, 2)]
    #[case(18, 2)]
    #[case(19, 3)]
    fn test_total_pages(#[case] items: usize, #[case] expected: usize) {
        assert_eq!(total_pages(items, DEFAULT_PAGE_SIZE), expected);
    }

    #[test]
    fn test_second_page_of_ten_holds_one_item() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(page_slice(&items, 2, 9), &[9]);
        assert!(page_slice(&items, 3, 9).is_empty());
    }

    #[test]
    fn test_page_links_small_total_has_no_ellipsis() {
        use PageLink::{Ellipsis, Page};
        assert_eq!(page_links(1, 1), vec![Page(1)]);
        assert_eq!(page_links(1, 2), vec![Page(1), Page(2)]);
        assert_eq!(page_links(2, 3), vec![Page(1), Page(2), Page(3)]);
        assert!(!page_links(3, 5).contains(&Ellipsis));
    }

    #[test]
    fn test_page_links_middle_of_long_range() {
        use PageLink::{Ellipsis, Page};
        assert_eq!(
            page_links(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(page_links(1, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
        assert_eq!(page_links(10, 10), vec![Page(1), Ellipsis, Page(9), Page(10)]);
    }

    #[test]
    fn test_prev_next_flags() {
        assert!(!has_previous(1));
        assert!(has_previous(2));
        assert!(has_next(1, 2));
        assert!(!has_next(2, 2));
    }

    proptest! {
        #[test]
        fn prop_pages_partition_items(len in 0usize..200, size in 1usize..20) {
            let items: Vec<usize> = (0..len).collect();
            let pages = total_pages(len, size);
            let mut seen = Vec::new();
            for page in 1..=pages {
                let slice = page_slice(&items, page, size);
                prop_assert!(slice.len() <= size);
                seen.extend_from_slice(slice);
            }
            prop_assert_eq!(seen, items);
            prop_assert!(page_slice(&(0..len).collect::<Vec<_>>(), pages + 1, size).is_empty());
        }

        #[test]
        fn prop_page_links_are_strictly_increasing(total in 1usize..60, current in 1usize..60) {
            let numbers: Vec<usize> = page_links(current, total)
                .into_iter()
                .filter_map(|link| match link {
                    PageLink::Page(n) => Some(n),
                    PageLink::Ellipsis => None,
                })
                .collect();
            prop_assert_eq!(numbers.first().copied(), Some(1));
            prop_assert_eq!(numbers.last().copied(), Some(total));
            prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
