//! Growing-limit pagination for live queries.
//!
//! Live queries re-deliver the whole result up to their limit on every change, so instead of
//! offsets the window only ever grows by one page. Fewer results than requested means the
//! collection is exhausted; asking for more at that point would only re-read what is loaded.

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    page_size: usize,
    documents_needed: usize,
    end_reached: bool,
}

impl PaginationCursor {
    /// A page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);

        Self {
            page_size,
            documents_needed: page_size,
            end_reached: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current limit for the live query.
    pub fn documents_needed(&self) -> usize {
        self.documents_needed
    }

    pub fn end_reached(&self) -> bool {
        self.end_reached
    }

    /// Grows the window by one page. Returns `false` without changing anything once the end
    /// has been reached.
    pub fn request_more(&mut self) -> bool {
        if self.end_reached {
            return false;
        }

        self.documents_needed += self.page_size;
        true
    }

    /// Records the size of the latest snapshot.
    pub fn observe(&mut self, result_count: usize) {
        self.end_reached = result_count < self.documents_needed;
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
