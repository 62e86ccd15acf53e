//! Behavior tests for the query cache and fetch orchestrator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::StubCatalog;
use hakken::query::{QueryCache, QueryKey, QueryStatus};

fn search_key(page: u32) -> QueryKey {
    QueryKey::search("bleach", page, 20)
}

#[tokio::test]
async fn concurrent_fetches_for_one_key_issue_one_request() {
    let stub = Arc::new(StubCatalog::new().with_delay(Duration::from_millis(50)));
    let cache = QueryCache::new(stub.clone());
    let key = search_key(1);

    let (a, b) = tokio::join!(cache.fetch(&key), cache.fetch(&key));

    assert_eq!(stub.list_call_count(), 1);
    assert_eq!(a.status, QueryStatus::Success);
    assert_eq!(b.status, QueryStatus::Success);
}

#[tokio::test]
async fn fresh_results_are_served_from_cache() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());
    let key = search_key(1);

    cache.fetch(&key).await;
    let second = cache.fetch(&key).await;

    assert_eq!(stub.list_call_count(), 1);
    assert_eq!(second.status, QueryStatus::Success);
    assert!(second.data.is_some());
}

#[tokio::test]
async fn prefetch_warms_the_cache_for_the_next_page() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());
    let key = search_key(2);

    cache.prefetch(&key);
    // let the spawned prefetch task finish
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = cache.fetch(&key).await;
    assert_eq!(stub.list_call_count(), 1);
    assert_eq!(snapshot.status, QueryStatus::Success);
}

#[tokio::test]
async fn prefetch_of_a_fresh_key_is_a_no_op() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());
    let key = search_key(1);

    cache.fetch(&key).await;
    cache.prefetch(&key);
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.fetch(&key).await;

    assert_eq!(stub.list_call_count(), 1);
}

#[tokio::test]
async fn page_turn_keeps_previous_page_as_placeholder() {
    let stub = Arc::new(StubCatalog::new().with_delay(Duration::from_millis(50)));
    let cache = QueryCache::new(stub.clone());

    cache.fetch(&search_key(1)).await;

    // Page 2 has never been fetched: its own entry is empty, but the last
    // successful search result stands in while it loads.
    let placeholder = cache
        .data_or_placeholder(&search_key(2))
        .and_then(|data| data.as_list().cloned())
        .unwrap();
    assert_eq!(placeholder.pagination.current_page, 1);

    let snapshot = cache.fetch(&search_key(2)).await;
    let page = snapshot.data.unwrap().as_list().cloned().unwrap();
    assert_eq!(page.pagination.current_page, 2);
}

#[tokio::test]
async fn placeholders_do_not_cross_operation_kinds() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());

    cache.fetch(&search_key(1)).await;

    assert!(cache.data_or_placeholder(&QueryKey::top(1, 20)).is_none());
    assert!(cache.data_or_placeholder(&QueryKey::detail("21")).is_none());
}

#[tokio::test]
async fn failed_fetch_surfaces_error_and_refetch_recovers() {
    let stub = Arc::new(StubCatalog::new().failing_first(1));
    let cache = QueryCache::new(stub.clone());
    let key = search_key(1);

    let failed = cache.fetch(&key).await;
    assert_eq!(failed.status, QueryStatus::Error);
    assert!(failed.error.is_some());
    assert!(failed.data.is_none());

    let recovered = cache.refetch(&key).await;
    assert_eq!(stub.list_call_count(), 2);
    assert_eq!(recovered.status, QueryStatus::Success);
    assert!(recovered.error.is_none());
}

#[tokio::test]
async fn invalidate_forces_a_new_request() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());
    let key = search_key(1);

    cache.fetch(&key).await;
    cache.invalidate(&key);
    cache.fetch(&key).await;

    assert_eq!(stub.list_call_count(), 2);
}

#[tokio::test]
async fn stale_entries_are_refetched() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::with_stale_after(stub.clone(), Duration::ZERO);
    let key = search_key(1);

    cache.fetch(&key).await;
    cache.fetch(&key).await;

    assert_eq!(stub.list_call_count(), 2);
}

#[tokio::test]
async fn detail_fetches_resolve_by_id() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());

    let snapshot = cache.fetch(&QueryKey::detail("21")).await;
    let detail = snapshot.data.unwrap().as_detail().cloned().unwrap();
    assert_eq!(detail.mal_id, 21);
    assert_eq!(stub.detail_call_count(), 1);

    let failed = cache.fetch(&QueryKey::detail("not-a-number")).await;
    assert_eq!(failed.status, QueryStatus::Error);
}

#[tokio::test]
async fn evict_older_than_drops_settled_entries() {
    let stub = Arc::new(StubCatalog::new());
    let cache = QueryCache::new(stub.clone());

    cache.fetch(&search_key(1)).await;
    cache.fetch(&search_key(2)).await;
    assert_eq!(cache.len(), 2);

    cache.evict_older_than(Duration::ZERO);
    assert!(cache.is_empty());
}
