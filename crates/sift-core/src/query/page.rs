//! Page requests and page results

use serde::Serialize;

use crate::error::{Error, Result};

/// Zero-based window into an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_index: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate a window; `page_size` must be positive and the offset must fit SQLite's i64
    pub fn new(page_index: u32, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidPageRequest(
                "page size must be greater than zero".to_string(),
            ));
        }

        let offset = u64::from(page_index) * u64::from(page_size);
        if i64::try_from(offset).is_err() {
            return Err(Error::InvalidPageRequest(format!(
                "page {} of size {} is out of range",
                page_index, page_size
            )));
        }

        Ok(Self {
            page_index,
            page_size,
        })
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> i64 {
        // Range checked in `new`
        (u64::from(self.page_index) * u64::from(self.page_size)) as i64
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// One page of results plus total-accurate pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page_index: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(request.page_size)),
            page_index: request.page_index,
            page_size: request.page_size,
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_first(&self) -> bool {
        self.page_index == 0
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_index) + 1 < self.total_pages
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Project the content, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        let request = PageRequest::new(3, 10).unwrap();
        assert_eq!(request.offset(), 30);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            PageRequest::new(0, 0),
            Err(Error::InvalidPageRequest(_))
        ));
    }

    #[test]
    fn test_offset_must_fit_sqlite_integer() {
        let request = PageRequest::new(u32::MAX, 30).unwrap();
        assert_eq!(request.offset(), i64::from(u32::MAX) * 30);

        assert!(matches!(
            PageRequest::new(u32::MAX, u32::MAX),
            Err(Error::InvalidPageRequest(_))
        ));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let request = PageRequest::new(0, 2).unwrap();
        assert_eq!(Page::<u8>::new(vec![], request, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![1], request, 1).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![1, 2], request, 3).total_pages, 2);
        assert_eq!(Page::<u8>::new(vec![1, 2], request, 4).total_pages, 2);
    }

    #[test]
    fn test_navigation_flags() {
        let first = Page::<u8>::new(vec![1, 2], PageRequest::new(0, 2).unwrap(), 3);
        assert!(first.is_first());
        assert!(first.has_next());

        let last = Page::<u8>::new(vec![3], PageRequest::new(1, 2).unwrap(), 3);
        assert!(!last.is_first());
        assert!(last.is_last());

        let beyond = Page::<u8>::new(vec![], PageRequest::new(9, 2).unwrap(), 3);
        assert!(beyond.is_last());
        assert_eq!(beyond.total_elements, 3);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2).unwrap(), 5);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.content, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(mapped.total_elements, 5);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.page_size, 2);
    }
}
