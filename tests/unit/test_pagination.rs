//! Unit tests for the pagination envelope and its link building

use recipe_sharing_api::models::{MAX_LIMIT, Page, PageQuery, Pagination};
use url::Url;

fn base() -> Url {
    Url::parse("http://localhost:8080").unwrap()
}

#[test]
fn test_first_page_has_next_but_no_previous() {
    let pagination = Pagination::new(1, 6);
    let page = Page::new(
        vec![1, 2, 3, 4, 5, 6],
        14,
        &pagination,
        &base(),
        "/api/recipes/",
        &[],
    );

    assert_eq!(page.count, 14);
    assert!(page.previous.is_none());
    assert_eq!(
        page.next.as_deref(),
        Some("http://localhost:8080/api/recipes/?page=2")
    );
}

#[test]
fn test_middle_page_links_both_ways() {
    let pagination = Pagination::new(3, 6);
    let page = Page::new(vec![0; 6], 20, &pagination, &base(), "/api/recipes/", &[]);

    assert_eq!(
        page.previous.as_deref(),
        Some("http://localhost:8080/api/recipes/?page=2")
    );
    assert_eq!(
        page.next.as_deref(),
        Some("http://localhost:8080/api/recipes/?page=4")
    );
}

#[test]
fn test_second_page_previous_drops_page_param() {
    let pagination = Pagination::new(2, 6);
    let page = Page::new(vec![0; 6], 20, &pagination, &base(), "/api/recipes/", &[]);

    // Page 1 is canonical without an explicit page parameter
    assert_eq!(
        page.previous.as_deref(),
        Some("http://localhost:8080/api/recipes/")
    );
}

#[test]
fn test_last_page_has_no_next() {
    let pagination = Pagination::new(3, 6);
    let page = Page::new(vec![0; 2], 14, &pagination, &base(), "/api/recipes/", &[]);
    assert!(page.next.is_none());
}

#[test]
fn test_links_preserve_extra_params() {
    let pagination = Pagination::new(2, 3);
    let extra = [
        ("limit", "3".to_string()),
        ("tags", "breakfast".to_string()),
    ];
    let page = Page::new(vec![0; 3], 9, &pagination, &base(), "/api/recipes/", &extra);

    assert_eq!(
        page.next.as_deref(),
        Some("http://localhost:8080/api/recipes/?limit=3&tags=breakfast&page=3")
    );
    assert_eq!(
        page.previous.as_deref(),
        Some("http://localhost:8080/api/recipes/?limit=3&tags=breakfast")
    );
}

#[test]
fn test_from_query_defaults() {
    let pagination = Pagination::from_query(&PageQuery::default(), 6).unwrap();
    assert_eq!(pagination, Pagination::new(1, 6));
}

#[test]
fn test_from_query_parses_page_and_limit() {
    let query = PageQuery {
        page: Some("3".into()),
        limit: Some("10".into()),
    };
    assert_eq!(
        Pagination::from_query(&query, 6).unwrap(),
        Pagination::new(3, 10)
    );
}

#[test]
fn test_from_query_rejects_bad_page() {
    for bad in ["abc", "0", "-1", "1.5"] {
        let query = PageQuery {
            page: Some(bad.into()),
            limit: None,
        };
        assert!(
            Pagination::from_query(&query, 6).is_none(),
            "page={} should be rejected",
            bad
        );
    }
}

#[test]
fn test_from_query_ignores_bad_limit() {
    for bad in ["abc", "0", "-2"] {
        let query = PageQuery {
            page: None,
            limit: Some(bad.into()),
        };
        assert_eq!(
            Pagination::from_query(&query, 6).unwrap().limit,
            6,
            "limit={} should fall back to the default",
            bad
        );
    }
}

#[test]
fn test_limit_is_capped() {
    let query = PageQuery {
        page: None,
        limit: Some("5000".into()),
    };
    assert_eq!(Pagination::from_query(&query, 6).unwrap().limit, MAX_LIMIT);
}

#[test]
fn test_is_valid_page() {
    // Page 1 is always valid, even for an empty result set
    assert!(Pagination::new(1, 6).is_valid_page(0));

    let second = Pagination::new(2, 6);
    assert!(!second.is_valid_page(6));
    assert!(second.is_valid_page(7));
}
