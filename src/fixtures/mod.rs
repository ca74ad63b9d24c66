//! Test fixtures and helper data.

use crate::errors::RestResult;
use crate::paging::Page;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Base URL used by scripted-transport tests.
pub const TEST_BASE_URL: &str = "http://localhost";

/// A sample decoded entity body.
pub fn sample_widget_json() -> serde_json::Value {
    json!({"id": 7, "name": "spanner"})
}

/// A generic structural error body.
pub fn structured_error_body() -> serde_json::Value {
    json!({"data": "I'm the body!"})
}

/// An error body in the cloud error envelope.
pub fn cloud_error_body(code: &str, message: &str) -> serde_json::Value {
    json!({"error": {"code": code, "message": message}})
}

/// Builds a first page plus a fetcher serving the remaining pages in order,
/// with continuation tokens `"page-1"`, `"page-2"`, ... and a counter of
/// fetch calls.
///
/// Panics if a token is requested out of order or twice; a re-fetch is a
/// bookkeeping bug the tests must surface.
pub fn scripted_pages<T: Clone + Send + 'static>(
    pages: Vec<Vec<T>>,
) -> (
    Page<T>,
    impl FnMut(&str) -> RestResult<Page<T>> + Send + 'static,
    Arc<AtomicUsize>,
) {
    assert!(!pages.is_empty(), "need at least one page");
    let total = pages.len();
    let token_for = move |index: usize| {
        if index + 1 < total {
            Some(format!("page-{}", index + 1))
        } else {
            None
        }
    };

    let mut pages: Vec<Option<Vec<T>>> = pages.into_iter().map(Some).collect();
    let first = Page::new(pages[0].take().unwrap(), token_for(0));
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();

    let fetcher = move |token: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        let index: usize = token
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("unexpected continuation token `{}`", token));
        let items = pages[index]
            .take()
            .unwrap_or_else(|| panic!("page `{}` fetched twice", token));
        Ok(Page::new(items, token_for(index)))
    };

    (first, fetcher, fetches)
}
