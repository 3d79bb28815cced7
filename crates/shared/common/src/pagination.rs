//! Pagination types for list operations.

use serde::Serialize;

/// One page of results together with the total number of matches.
///
/// `total` counts every matching document, while `data` only holds the
/// documents that decoded successfully, so `data.len()` may be smaller than
/// the page size even on a middle page.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub skip: u64,
    /// 0 means unbounded
    pub limit: u64,
    pub total: u64,
    /// Number of decoded records in this page
    pub returned: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated response
    pub fn new(data: Vec<T>, skip: u64, limit: u64, total: u64) -> Self {
        let returned = data.len() as u64;
        Self {
            data,
            meta: PaginationMeta {
                skip,
                limit,
                total,
                returned,
            },
        }
    }

    /// Check whether matches exist past this page
    pub fn has_more(&self) -> bool {
        self.meta.limit > 0 && self.meta.skip.saturating_add(self.meta.limit) < self.meta.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        let page = Paginated::new(vec![1, 2, 3, 4, 5], 10, 5, 20);
        assert!(page.has_more());
        assert_eq!(page.meta.returned, 5);

        let last = Paginated::new(vec![1, 2, 3, 4, 5], 15, 5, 20);
        assert!(!last.has_more());
    }

    #[test]
    fn test_has_more_with_huge_skip() {
        let page = Paginated::<u8>::new(vec![], u64::MAX, 5, 20);
        assert!(!page.has_more());
    }

    #[test]
    fn test_unbounded_never_has_more() {
        let page = Paginated::new(vec![1, 2], 0, 0, 20);
        assert!(!page.has_more());
    }

    #[test]
    fn test_returned_may_differ_from_total() {
        let page = Paginated::new(vec!["a"], 0, 5, 3);
        assert_eq!(page.meta.returned, 1);
        assert_eq!(page.meta.total, 3);
    }
}
