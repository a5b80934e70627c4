use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Pagination envelope returned next to every paged list.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Clamp raw query values to sane bounds (page >= 1, 1 <= limit <= 100).
pub fn normalize(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

pub fn paginate(page: u64, limit: u64, total: u64) -> Pagination {
    let total_pages = total.div_ceil(limit);

    Pagination {
        page,
        limit,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

pub fn skip(page: u64, limit: u64) -> u64 {
    (page - 1) * limit
}
