//! Pagination types for the admin list endpoints.

use serde::{Deserialize, Serialize};

/// Page-numbered query parameters for list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<i64>,
    /// Items per page (default: 20, max: 100)
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped() {
        let q = PageQuery {
            page: None,
            limit: Some(500),
        };
        assert_eq!(q.limit(), 100);
        let q = PageQuery {
            page: None,
            limit: Some(0),
        };
        assert_eq!(q.limit(), 1);
        assert_eq!(PageQuery::default().limit(), 20);
    }

    #[test]
    fn test_offset_from_page() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(q.offset(), 40);
        let q = PageQuery {
            page: Some(0),
            limit: None,
        };
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_total_pages() {
        let p = Paginated::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(p.total_pages, 3);
        let p: Paginated<i64> = Paginated::new(vec![], 0, 1, 20);
        assert_eq!(p.total_pages, 0);
    }
}
