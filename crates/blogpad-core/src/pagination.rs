//! Page-number pagination over ordered listings.
//!
//! The paginator only does arithmetic: it turns a total count and a raw `page`
//! query value into a [`PageWindow`], the repository fetches that window, and
//! the records are wrapped into a [`Page`] for rendering.

use serde::Serialize;

/// Default number of posts shown per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Fixed-size page calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Number of pages for `total` records. An empty listing still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a requested page against `total` records.
    ///
    /// Absent or non-numeric input selects page 1; numbers outside
    /// `1..=num_pages` clamp to the nearest valid page.
    pub fn window(&self, total: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested.map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => 1,
                Ok(n) => (n as u64).min(num_pages),
                // Integers too large for i64 are still past the last page.
                Err(_) if is_integer(raw) && !raw.starts_with('-') => num_pages,
                Err(_) => 1,
            },
        };

        PageWindow {
            number,
            num_pages,
            total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// The slice of a listing that one page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Attach the fetched records.
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

/// One page of records plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then_some(self.number - 1)
    }

    /// All page numbers, for rendering numbered links.
    pub fn page_range(&self) -> std::ops::RangeInclusive<u64> {
        1..=self.num_pages
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
