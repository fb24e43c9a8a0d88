//! Page arithmetic over ordered result sets.
//!
//! The paginator never fetches data. The same component serves server-side
//! windows (records arrive already sliced, total supplied separately) and
//! in-memory slicing of a filtered list.

use serde::Serialize;

use crate::errors::PaginationError;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const MAX_PAGE_SIZE: usize = 10;

/// Navigation metadata for one rendered page. Computed per request, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    pub has_prev: bool,
    pub has_next: bool,
    /// 1-based inclusive display range; both 0 for an empty set.
    pub start_item: usize,
    pub end_item: usize,
}

impl PageInfo {
    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::InvalidPageSize(page_size));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// Reject pages below 1 or past the last existing page.
    ///
    /// Page 1 of an empty set is valid (it renders as an empty page). The page is
    /// returned unchanged; callers decide how to recover.
    pub fn validate_page(&self, page: usize, total_items: usize) -> Result<usize, PaginationError> {
        let total_pages = self.total_pages(total_items);
        if page < 1 || (total_pages > 0 && page > total_pages) {
            return Err(PaginationError::OutOfRange { page, total_pages });
        }
        Ok(page)
    }

    pub fn page_info(&self, page: usize, total_items: usize) -> PageInfo {
        let total_pages = self.total_pages(total_items);
        let start_item = if total_items > 0 {
            self.offset(page).saturating_add(1)
        } else {
            0
        };

        PageInfo {
            current_page: page,
            total_pages,
            total_items,
            page_size: self.page_size,
            has_prev: page > 1,
            has_next: page < total_pages,
            start_item,
            end_item: page.saturating_mul(self.page_size).min(total_items),
        }
    }

    /// Zero-based offset of the first item on `page`.
    pub fn offset(&self, page: usize) -> usize {
        page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Slice one page out of an in-memory list.
    ///
    /// Does not validate `page`: a page past the end yields an empty slice, which
    /// is what a caller sees after a local filter shrank the list.
    pub fn paginate<'a, T>(&self, data: &'a [T], page: usize) -> (&'a [T], PageInfo) {
        let info = self.page_info(page, data.len());
        let start = self.offset(page).min(data.len());
        let end = start.saturating_add(self.page_size).min(data.len());
        (&data[start..end], info)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page request as issued by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageRequest {
    pub fn resolve(self) -> Result<PageInfo, PaginationError> {
        let paginator = Paginator::new(self.page_size)?;
        let page = paginator.validate_page(self.page, self.total_items)?;
        Ok(paginator.page_info(page, self.total_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five() -> Paginator {
        Paginator::new(5).unwrap()
    }

    #[test]
    fn total_pages_brackets_item_count() {
        for page_size in 1..=10 {
            let p = Paginator::new(page_size).unwrap();
            assert_eq!(p.total_pages(0), 0);
            for total in 1..=60 {
                let pages = p.total_pages(total);
                assert!(pages > 0);
                assert!((pages - 1) * page_size < total, "size={page_size} total={total}");
                assert!(total <= pages * page_size, "size={page_size} total={total}");
            }
        }
    }

    #[test]
    fn empty_set_first_page() {
        let info = five().page_info(1, 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_prev);
        assert!(!info.has_next);
        assert_eq!(info.start_item, 0);
        assert_eq!(info.end_item, 0);
        assert!(info.is_empty());
    }

    #[test]
    fn first_and_last_page_of_twelve() {
        let p = five();

        let first = p.page_info(1, 12);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next);
        assert!(!first.has_prev);
        assert_eq!((first.start_item, first.end_item), (1, 5));

        let last = p.page_info(3, 12);
        assert!(!last.has_next);
        assert!(last.has_prev);
        assert_eq!((last.start_item, last.end_item), (11, 12));
    }

    #[test]
    fn validate_rejects_past_last_page() {
        let p = five();
        assert_eq!(
            p.validate_page(4, 12),
            Err(PaginationError::OutOfRange {
                page: 4,
                total_pages: 3
            })
        );
        assert_eq!(p.validate_page(3, 12), Ok(3));
        assert!(p.validate_page(0, 12).is_err());
    }

    #[test]
    fn validate_allows_first_page_of_empty_set() {
        let p = five();
        assert_eq!(p.validate_page(1, 0), Ok(1));
        assert!(p.validate_page(0, 0).is_err());
        // No pages exist, so only the lower bound applies.
        assert_eq!(p.validate_page(2, 0), Ok(2));
    }

    #[test]
    fn page_info_is_pure() {
        let p = five();
        assert_eq!(p.page_info(2, 12), p.page_info(2, 12));
    }

    #[test]
    fn paginate_slices_uneven_tail() {
        let data: Vec<u32> = (1..=12).collect();
        let p = five();

        let (page, info) = p.paginate(&data, 3);
        assert_eq!(page, &[11, 12]);
        assert_eq!(info.current_page, 3);

        let (page, _) = p.paginate(&data, 2);
        assert_eq!(page, &[6, 7, 8, 9, 10]);
    }

    #[test]
    fn paginate_is_lenient_past_the_end() {
        let data: Vec<u32> = (1..=7).collect();
        let (page, info) = five().paginate(&data, 4);
        assert!(page.is_empty());
        assert!(!info.has_next);
    }

    #[test]
    fn concurrent_delete_shrinks_last_page_out_of_range() {
        let p = five();
        // User was on page 3 of 11 items; another user deleted one item.
        assert!(p.validate_page(3, 11).is_ok());
        assert!(p.validate_page(3, 10).is_err());
    }

    #[test]
    fn zero_page_size_rejected() {
        assert_eq!(
            Paginator::new(0),
            Err(PaginationError::InvalidPageSize(0))
        );
    }

    #[test]
    fn page_request_resolves_through_paginator() {
        let req = PageRequest {
            page: 2,
            page_size: 5,
            total_items: 12,
        };
        let info = req.resolve().unwrap();
        assert_eq!((info.start_item, info.end_item), (6, 10));

        let bad = PageRequest { page: 9, ..req };
        assert!(bad.resolve().is_err());
    }
}
