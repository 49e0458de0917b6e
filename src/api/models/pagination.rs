//! Page-number pagination with an envelope response.
//!
//! List endpoints take `page` and `limit` query parameters and answer with
//! `{count, next, previous, results}` where `next`/`previous` are absolute
//! URLs preserving the caller's query string.

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use super::recipe::RecipeResponse;
use super::user::{SubscriptionResponse, UserResponse};

/// Hard cap on page size regardless of what the client asks for.
pub const MAX_LIMIT: u32 = 100;

/// Raw pagination query parameters. Kept as strings so malformed values
/// can be handled leniently instead of rejecting the whole query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Create pagination parameters, clamping out-of-range values.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Build from query parameters. `None` when the page parameter is not
    /// a positive integer; a malformed limit falls back to the default.
    pub fn from_query(query: &PageQuery, default_limit: u32) -> Option<Self> {
        let page = match query.page.as_deref() {
            None => 1,
            Some(raw) => raw.trim().parse::<u32>().ok().filter(|p| *p >= 1)?,
        };
        let limit = query
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(default_limit);
        Some(Self::new(page, limit))
    }

    /// Row offset for SQL queries.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }

    /// A page past the end of the result set is invalid; page 1 is always
    /// valid, even for an empty set.
    pub fn is_valid_page(&self, total: i64) -> bool {
        self.page == 1 || self.offset() < total
    }
}

/// Paginated response envelope.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    UserPage = Page<UserResponse>,
    RecipePage = Page<RecipeResponse>,
    SubscriptionPage = Page<SubscriptionResponse>
)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: i64,
    /// Absolute URL of the next page, null on the last page
    pub next: Option<String>,
    /// Absolute URL of the previous page, null on the first page
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble the envelope. `extra` carries the non-page query parameters
    /// to preserve in the `next`/`previous` links.
    pub fn new(
        results: Vec<T>,
        count: i64,
        pagination: &Pagination,
        base: &Url,
        path: &str,
        extra: &[(&str, String)],
    ) -> Self {
        let has_next = i64::from(pagination.page) * i64::from(pagination.limit) < count;
        let next = has_next.then(|| page_url(base, path, extra, pagination.page + 1));
        let previous =
            (pagination.page > 1).then(|| page_url(base, path, extra, pagination.page - 1));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Build an absolute page link. The `page` parameter is omitted for page 1,
/// matching the canonical form of the first page.
fn page_url(base: &Url, path: &str, extra: &[(&str, String)], page: u32) -> String {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in extra {
            pairs.append_pair(key, value);
        }
        if page > 1 {
            pairs.append_pair("page", &page.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let p = Pagination::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);

        let p = Pagination::new(3, 500);
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, MAX_LIMIT);
    }

    #[test]
    fn offset_math() {
        assert_eq!(Pagination::new(1, 6).offset(), 0);
        assert_eq!(Pagination::new(4, 6).offset(), 18);
    }

    #[test]
    fn from_query_defaults() {
        let p = Pagination::from_query(&PageQuery::default(), 6);
        assert_eq!(p, Some(Pagination::new(1, 6)));

        let q = PageQuery {
            page: Some("2".to_string()),
            limit: Some("10".to_string()),
        };
        assert_eq!(Pagination::from_query(&q, 6), Some(Pagination::new(2, 10)));
    }

    #[test]
    fn from_query_rejects_bad_page_but_not_bad_limit() {
        let q = PageQuery {
            page: Some("abc".to_string()),
            limit: None,
        };
        assert_eq!(Pagination::from_query(&q, 6), None);

        let q = PageQuery {
            page: Some("0".to_string()),
            limit: None,
        };
        assert_eq!(Pagination::from_query(&q, 6), None);

        let q = PageQuery {
            page: None,
            limit: Some("abc".to_string()),
        };
        assert_eq!(Pagination::from_query(&q, 6), Some(Pagination::new(1, 6)));

        let q = PageQuery {
            page: None,
            limit: Some("0".to_string()),
        };
        assert_eq!(Pagination::from_query(&q, 6), Some(Pagination::new(1, 6)));
    }

    #[test]
    fn page_validity() {
        let p = Pagination::new(1, 6);
        assert!(p.is_valid_page(0));

        let p = Pagination::new(2, 6);
        assert!(!p.is_valid_page(6));
        assert!(p.is_valid_page(7));
    }
}
