use serde::Serialize;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A 1-based page request. Out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    limit: u32,
}

impl Page {
    pub fn new(number: u32, limit: u32) -> Self {
        Self { number: number.max(1), limit: limit.clamp(1, MAX_LIMIT) }
    }

    pub fn first(limit: u32) -> Self {
        Self::new(1, limit)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: &Page, total: u64) -> Self {
        let limit = u64::from(page.limit);
        let pages = total.div_ceil(limit);
        Self {
            current: page.number,
            pages,
            total,
            has_next: u64::from(page.number) < pages,
            has_prev: page.number > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: &Page, total: i64) -> Self {
        let total = u64::try_from(total).unwrap_or_default();
        Self { items, pagination: Pagination::new(page, total) }
    }
}
