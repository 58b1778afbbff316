// ABOUTME: Page metadata for paginated response envelopes
// ABOUTME: Derives total pages from total item count and page size
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use serde::{Deserialize, Serialize};

/// Default page size when a request does not specify one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Page metadata attached to paginated success envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// 1-based page number
    pub page_number: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Total number of items across all pages
    pub total_items: i64,
}

impl PageMeta {
    /// Build page metadata; `total_pages = ceil(total_items / page_size)`
    #[must_use]
    pub fn new(page_number: i64, page_size: i64, total_items: i64) -> Self {
        let page_size = if page_size > 0 {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            page_number,
            total_pages: (total_items + page_size - 1) / page_size,
            total_items,
        }
    }

    /// Whether a previous page exists
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    /// Whether a next page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }
}

/// Clamp requested paging values to sane bounds
#[must_use]
pub fn normalize(page_number: i64, page_size: i64) -> (i64, i64) {
    let page_number = page_number.max(1);
    let page_size = if page_size > 0 {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    };
    (page_number, page_size)
}
