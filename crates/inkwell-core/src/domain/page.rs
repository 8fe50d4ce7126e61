//! Page-number pagination.

use serde::{Deserialize, Serialize};

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: u64, per_page: u64) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Zero-based page index, as used by offset paginators.
    pub fn index(&self) -> u64 {
        self.number - 1
    }

    /// Saturates instead of overflowing; such a page is past the end anyway.
    pub fn offset(&self) -> u64 {
        self.index().saturating_mul(self.per_page)
    }
}

/// One page of results plus the numbers needed to render page links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        // An empty listing still has a (blank) first page.
        let total_pages = total_items.div_ceil(request.per_page).max(1);
        Self {
            items,
            number: request.number,
            per_page: request.per_page,
            total_items,
            total_pages,
        }
    }

    /// Slice an already-ordered collection.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.per_page as usize)
            .collect();
        Self::new(items, request, total)
    }

    /// Pages past the last one do not exist.
    pub fn is_out_of_range(&self) -> bool {
        self.number > self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_slices_requested_page() {
        let page = Page::from_vec((1..=25).collect::<Vec<u32>>(), PageRequest::new(3, 10));

        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert!(!page.is_out_of_range());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page: Page<u32> = Page::from_vec(Vec::new(), PageRequest::new(1, 10));

        assert_eq!(page.total_pages, 1);
        assert!(!page.is_out_of_range());
    }

    #[test]
    fn test_page_past_end_is_out_of_range() {
        let page = Page::from_vec(vec![1, 2, 3], PageRequest::new(2, 10));

        assert!(page.is_out_of_range());
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let request = PageRequest::new(u64::MAX, 10);
        assert_eq!(request.offset(), u64::MAX);

        let page = Page::from_vec(vec![1, 2, 3], request);
        assert!(page.is_out_of_range());
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_zero_page_clamps_to_first() {
        let request = PageRequest::new(0, 0);

        assert_eq!(request.number, 1);
        assert_eq!(request.per_page, 1);
        assert_eq!(request.offset(), 0);
    }
}
