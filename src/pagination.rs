use serde::Serialize;

/// One page of a listing, as exposed to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub current_page: i64,
    pub total_pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
    pub is_paginated: bool,
}

impl Page {
    /// Resolve the requested page against `total` items. Returns `None` for a
    /// page outside `1..=total_pages`; page 1 of an empty listing exists.
    pub fn resolve(requested: Option<i64>, total: i64, per_page: i64) -> Option<Page> {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let total_pages = ((total + per_page - 1) / per_page).max(1);
        let current_page = requested.unwrap_or(1);
        if current_page < 1 || current_page > total_pages {
            return None;
        }

        let has_next = current_page < total_pages;
        let has_previous = current_page > 1;
        Some(Page {
            current_page,
            total_pages,
            per_page,
            total,
            has_next,
            has_previous,
            next_page: has_next.then_some(current_page + 1),
            previous_page: has_previous.then_some(current_page - 1),
            is_paginated: total_pages > 1,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.current_page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
