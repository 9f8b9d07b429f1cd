use serde::{Deserialize, Serialize};

/// Upper bound on `limit` for any list request.
pub const MAX_LIMIT: usize = 100;

/// Page-based parameters for list/query operations.
///
/// `page` is 1-based. Out-of-range values are clamped rather than
/// rejected: `page = 0` reads as the first page and `limit` is kept
/// within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,

    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ListParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Number of items to skip for this page. Saturates, so a huge
    /// `page` reads as past the end instead of overflowing.
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
    pub current_page: usize,
    pub total: usize,
}

impl<T> ListResult<T> {
    /// Wrap one already-sliced page of a result set of `total` items.
    pub fn new(items: Vec<T>, total: usize, params: &ListParams) -> Self {
        Self {
            items,
            total_pages: total.div_ceil(params.limit()),
            current_page: params.page(),
            total,
        }
    }

    /// Slice a full, already-ordered result set down to the requested page.
    pub fn paginate(all: Vec<T>, params: &ListParams) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.limit())
            .collect();
        Self::new(items, total, params)
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_params_clamp() {
        let p = ListParams::new(0, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 0);

        let p = ListParams::new(3, 500);
        assert_eq!(p.limit(), MAX_LIMIT);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn test_huge_page_is_past_the_end() {
        let p = ListParams::new(usize::MAX, 10);
        assert_eq!(p.offset(), usize::MAX);

        let page = ListResult::paginate((1..=5).collect::<Vec<u32>>(), &p);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.current_page, usize::MAX);
    }

    #[test]
    fn test_paginate() {
        let all: Vec<u32> = (1..=25).collect();
        let page = ListResult::paginate(all, &ListParams::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page: ListResult<u32> = ListResult::paginate(vec![], &ListParams::default());
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_result_wire_names() {
        let page = ListResult::new(vec![1], 1, &ListParams::default());
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["totalPages"], 1);
        assert_eq!(v["currentPage"], 1);
        assert_eq!(v["total"], 1);
    }
}
