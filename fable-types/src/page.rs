use serde::Serialize;

/// One page of a larger result set.
///
/// Pages are 1-indexed. `pages` is the ceiling of `total / per_page`, so an
/// empty result set has zero pages. Requesting a page past the end yields an
/// empty `items` slice with `has_next = false`; there is no bounds clamping
/// and no error.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let pages = (total + per_page - 1) / per_page;
        let has_prev = page > 1;
        let has_next = page < pages;
        Self {
            items,
            total,
            page,
            per_page,
            pages,
            has_prev,
            has_next,
            prev_num: has_prev.then(|| page - 1),
            next_num: has_next.then(|| page + 1),
        }
    }

    /// SQL OFFSET for a 1-indexed page.
    pub fn offset(page: i64, per_page: i64) -> i64 {
        (page - 1) * per_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
            prev_num: self.prev_num,
            next_num: self.next_num,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_result_has_zero_pages() {
        let page = Page::<i32>::new(vec![], 0, 1, 5);
        assert_eq!(page.pages, 0);
        assert!(!page.has_prev);
        assert!(!page.has_next);
        assert_eq!(page.prev_num, None);
        assert_eq!(page.next_num, None);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 10, 2, 5);
        assert_eq!(page.pages, 2);
        assert!(page.has_prev);
        assert!(!page.has_next);
        assert_eq!(page.prev_num, Some(1));
    }

    #[test]
    fn test_partial_last_page() {
        let page = Page::new(vec![1], 11, 3, 5);
        assert_eq!(page.pages, 3);
        assert!(!page.has_next);
    }

    #[test]
    fn test_page_past_the_end() {
        let page = Page::<i32>::new(vec![], 3, 7, 5);
        assert_eq!(page.pages, 1);
        assert!(page.has_prev);
        assert!(!page.has_next);
        assert_eq!(page.next_num, None);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Page::<()>::offset(1, 5), 0);
        assert_eq!(Page::<()>::offset(3, 5), 10);
        assert_eq!(Page::<()>::offset(2, 20), 20);
    }

    proptest! {
        #[test]
        fn prop_pages_is_ceiling_division(total in 0i64..10_000, per_page in 1i64..100, page in 1i64..500) {
            let on_page = (total - Page::<()>::offset(page, per_page)).clamp(0, per_page);
            let items = vec![0u8; on_page as usize];
            let p = Page::new(items, total, page, per_page);

            prop_assert!(p.items.len() as i64 <= per_page);
            prop_assert_eq!(p.pages, (total + per_page - 1) / per_page);
            prop_assert_eq!(p.has_next, page < p.pages);
            prop_assert_eq!(p.has_prev, page > 1);
            if p.has_next {
                prop_assert_eq!(p.next_num, Some(page + 1));
            }
        }
    }
}
