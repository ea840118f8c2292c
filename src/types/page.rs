//! Offset pagination for the dashboard query surface

/// Window into a newest-first listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to skip
    pub offset: usize,
    /// Maximum number of items to return
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// First page of `limit` items
    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// The page following this one
    pub fn next(&self) -> Self {
        Self::new(self.offset.saturating_add(self.limit), self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(50)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Slice `source` (already in display order) according to `request`
    pub fn from_iter<I>(source: I, total: usize, request: PageRequest) -> Self
    where
        I: Iterator<Item = T>,
    {
        Page {
            items: source.skip(request.offset).take(request.limit).collect(),
            total,
            offset: request.offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len()) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::first_page(PageRequest::first(2), vec![10, 9], true)]
    #[case::middle_page(PageRequest::new(2, 2), vec![8, 7], true)]
    #[case::last_page(PageRequest::new(4, 2), vec![6], false)]
    #[case::past_the_end(PageRequest::new(9, 2), vec![], false)]
    #[case::zero_limit(PageRequest::first(0), vec![], true)]
    fn test_paging(
        #[case] request: PageRequest,
        #[case] expected: Vec<i32>,
        #[case] has_more: bool,
    ) {
        let source = vec![10, 9, 8, 7, 6];
        let page = Page::from_iter(source.into_iter(), 5, request);
        assert_eq!(page.items, expected);
        assert_eq!(page.total, 5);
        assert_eq!(page.has_more(), has_more);
    }

    #[test]
    fn test_next_page() {
        assert_eq!(PageRequest::first(20).next(), PageRequest::new(20, 20));
    }
}
