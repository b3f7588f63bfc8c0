use std::ops::Range;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: [usize; 6] = [5, 10, 20, 30, 40, 50];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("page size {0} is not one of 5, 10, 20, 30, 40, 50")]
pub struct PageSizeError(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(usize);

impl PageSize {
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = PageSizeError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if PAGE_SIZE_OPTIONS.contains(&value) {
            Ok(PageSize(value))
        } else {
            Err(PageSizeError(value))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub filtered_len: usize,
    pub can_previous_page: bool,
    pub can_next_page: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: PageSize,
}

impl PaginationState {
    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size.get())
    }

    fn last_index(&self, len: usize) -> usize {
        self.page_count(len).saturating_sub(1)
    }

    pub fn clamp(&mut self, len: usize) {
        self.page_index = self.page_index.min(self.last_index(len));
    }

    pub fn set_page_size(&mut self, size: PageSize, len: usize) {
        self.page_size = size;
        self.clamp(len);
    }

    pub fn first(&mut self) {
        self.page_index = 0;
    }

    pub fn previous(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn next(&mut self, len: usize) {
        if self.page_index + 1 < self.page_count(len) {
            self.page_index += 1;
        }
    }

    pub fn last(&mut self, len: usize) {
        self.page_index = self.last_index(len);
    }

    pub fn go_to(&mut self, index: usize, len: usize) {
        self.page_index = index.min(self.last_index(len));
    }

    /// Positions of the current page inside the filtered rows.
    pub fn page_range(&self, len: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size.get()).min(len);
        let end = (start + self.page_size.get()).min(len);
        start..end
    }

    pub fn info(&self, len: usize) -> PageInfo {
        let page_count = self.page_count(len);
        PageInfo {
            page_index: self.page_index,
            page_size: self.page_size.get(),
            page_count,
            filtered_len: len,
            can_previous_page: self.page_index > 0,
            can_next_page: self.page_index + 1 < page_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(page_index: usize, size: usize) -> PaginationState {
        PaginationState {
            page_index,
            page_size: PageSize::try_from(size).unwrap(),
        }
    }

    #[test]
    fn page_size_accepts_only_selector_values() {
        assert_eq!(PageSize::default().get(), 10);
        for size in PAGE_SIZE_OPTIONS {
            assert_eq!(PageSize::try_from(size).map(PageSize::get), Ok(size));
        }
        assert_eq!(PageSize::try_from(0), Err(PageSizeError(0)));
        assert_eq!(PageSize::try_from(15), Err(PageSizeError(15)));
    }

    #[test]
    fn page_count_is_ceiling_of_len_over_size() {
        for size in PAGE_SIZE_OPTIONS {
            for len in 0..120 {
                let expected = (len + size - 1) / size;
                assert_eq!(state(0, size).page_count(len), expected);
            }
        }
    }

    #[test]
    fn clamp_keeps_index_in_bounds() {
        for size in PAGE_SIZE_OPTIONS {
            for len in 0..70 {
                let mut pagination = state(50, size);
                pagination.clamp(len);
                let max_index = pagination.page_count(len).saturating_sub(1);
                assert!(pagination.page_index <= max_index);
                if len > 0 {
                    assert!(pagination.page_index * size < len);
                }
            }
        }
    }

    #[test]
    fn changing_page_size_clamps_index() {
        let mut pagination = state(4, 5);
        pagination.set_page_size(PageSize::try_from(20).unwrap(), 23);
        assert_eq!(pagination.page_index, 1);
        assert_eq!(pagination.page_count(23), 2);
    }

    #[test]
    fn boundary_navigation_is_a_no_op() {
        let mut pagination = state(0, 10);
        pagination.previous();
        assert_eq!(pagination.page_index, 0);

        pagination.last(25);
        assert_eq!(pagination.page_index, 2);
        pagination.next(25);
        assert_eq!(pagination.page_index, 2);

        pagination.first();
        pagination.next(25);
        assert_eq!(pagination.page_index, 1);
    }

    #[test]
    fn empty_set_has_no_pages_and_no_navigation() {
        let mut pagination = state(3, 10);
        pagination.clamp(0);
        let info = pagination.info(0);
        assert_eq!(info.page_count, 0);
        assert_eq!(info.page_index, 0);
        assert!(!info.can_previous_page);
        assert!(!info.can_next_page);
        assert_eq!(pagination.page_range(0), 0..0);
    }

    #[test]
    fn page_range_slices_last_partial_page() {
        let pagination = state(2, 10);
        assert_eq!(pagination.page_range(25), 20..25);
        let info = pagination.info(25);
        assert!(info.can_previous_page);
        assert!(!info.can_next_page);
    }

    #[test]
    fn go_to_clamps_past_the_end() {
        let mut pagination = state(0, 5);
        pagination.go_to(99, 12);
        assert_eq!(pagination.page_index, 2);
    }
}
