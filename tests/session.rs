//! Behavior tests for the persisted search session.

use std::thread::sleep;
use std::time::Duration;

use hakken::query::QueryKey;
use hakken::session::{
    LAST_ITEMS_PER_PAGE_KEY, LAST_PAGE_KEY, MemoryStore, SearchSession, StateStore,
    format_query_string, parse_query_string, resolve_initial_state,
};

const TEST_DEBOUNCE: Duration = Duration::from_millis(10);
const SETTLE: Duration = Duration::from_millis(30);

fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (key, value) in entries {
        store.set(key, value);
    }
    store
}

/// Mounts a session with a short debounce and the mount settle already
/// consumed, so tests observe only user-driven transitions.
fn settled_session(location: Option<&str>, store: MemoryStore) -> SearchSession<MemoryStore> {
    let mut session = SearchSession::mount(location, store).with_debounce(TEST_DEBOUNCE);
    let first = session.tick().unwrap();
    assert!(first.first);
    assert!(!first.page_reset);
    session
}

#[test]
fn location_page_wins_over_stored_page() {
    let store = store_with(&[(LAST_PAGE_KEY, "5")]);
    let state = resolve_initial_state(Some("?q=bleach&page=3"), &store);
    assert_eq!(state.search_term, "bleach");
    assert_eq!(state.page, 3);
    assert_eq!(state.items_per_page, 20);
}

#[test]
fn unparsable_location_page_falls_back_to_store() {
    let store = store_with(&[(LAST_PAGE_KEY, "5")]);
    let state = resolve_initial_state(Some("?page=abc"), &store);
    assert_eq!(state.page, 5);
}

#[test]
fn empty_inputs_resolve_to_defaults() {
    let state = resolve_initial_state(None, &MemoryStore::new());
    assert_eq!(state.search_term, "");
    assert_eq!(state.page, 1);
    assert_eq!(state.items_per_page, 20);
}

#[test]
fn out_of_range_values_degrade_silently() {
    let store = store_with(&[(LAST_PAGE_KEY, "0"), (LAST_ITEMS_PER_PAGE_KEY, "40")]);
    let state = resolve_initial_state(None, &store);
    assert_eq!(state.page, 1);
    assert_eq!(state.items_per_page, 20);

    let store = store_with(&[(LAST_ITEMS_PER_PAGE_KEY, "10")]);
    let state = resolve_initial_state(None, &store);
    assert_eq!(state.items_per_page, 10);
}

#[test]
fn query_string_round_trips() {
    assert_eq!(format_query_string("one piece", 2), "?q=one+piece&page=2");
    assert_eq!(format_query_string("", 1), "?page=1");

    let parsed = parse_query_string("?q=one+piece&page=2");
    assert_eq!(
        parsed,
        vec![
            ("q".to_string(), "one piece".to_string()),
            ("page".to_string(), "2".to_string()),
        ]
    );
}

#[test]
fn mount_settle_preserves_a_restored_page() {
    let session = settled_session(Some("?q=bleach&page=3"), MemoryStore::new());
    assert_eq!(session.page(), 3);
    assert_eq!(session.location(), "?q=bleach&page=3");
}

#[test]
fn new_search_term_resets_to_first_page() {
    let mut session = settled_session(Some("?q=bleach&page=3"), MemoryStore::new());

    session.set_search_term("naruto");
    assert_eq!(session.search_term(), "naruto");
    assert_eq!(session.debounced_term(), "bleach");
    assert!(session.tick().is_none());

    sleep(SETTLE);
    let settle = session.tick().unwrap();
    assert_eq!(settle.term, "naruto");
    assert!(settle.page_reset);
    assert_eq!(session.page(), 1);
    assert_eq!(session.debounced_term(), "naruto");
    assert_eq!(session.location(), "?q=naruto&page=1");
    assert_eq!(session.store().get(LAST_PAGE_KEY).as_deref(), Some("1"));
}

#[test]
fn reverting_the_term_before_the_quiet_period_never_settles() {
    let mut session = settled_session(Some("?q=bleach&page=3"), MemoryStore::new());

    session.set_search_term("bleach 2");
    session.set_search_term("bleach");
    sleep(SETTLE);
    assert!(session.tick().is_none());
    assert_eq!(session.page(), 3);
}

#[test]
fn page_turns_persist_without_resetting() {
    let mut session = settled_session(None, MemoryStore::new());

    session.set_page(4);
    assert_eq!(session.page(), 4);
    assert_eq!(session.store().get(LAST_PAGE_KEY).as_deref(), Some("4"));
    assert_eq!(session.location(), "?page=4");

    // no term change pending, so no settle and no reset
    sleep(SETTLE);
    assert!(session.tick().is_none());
    assert_eq!(session.page(), 4);
}

#[test]
fn page_size_change_is_an_explicit_reset() {
    let mut session = settled_session(Some("?page=4"), MemoryStore::new());

    session.set_items_per_page(10);
    assert_eq!(session.items_per_page(), 10);
    assert_eq!(session.page(), 1);
    assert_eq!(
        session.store().get(LAST_ITEMS_PER_PAGE_KEY).as_deref(),
        Some("10")
    );
    assert_eq!(session.store().get(LAST_PAGE_KEY).as_deref(), Some("1"));
    assert_eq!(session.location(), "?page=1");
}

#[test]
fn page_size_is_clamped_to_the_upstream_ceiling() {
    let mut session = settled_session(None, MemoryStore::new());

    session.set_items_per_page(40);
    assert_eq!(session.items_per_page(), 25);

    session.set_items_per_page(0);
    assert_eq!(session.items_per_page(), 1);
}

#[test]
fn location_updates_replace_instead_of_pushing() {
    let mut session = settled_session(Some("?q=bleach&page=3"), MemoryStore::new());

    session.set_page(4);
    session.set_page(5);
    session.set_search_term("naruto");
    sleep(SETTLE);
    session.tick().unwrap();

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.location(), "?q=naruto&page=1");
}

#[test]
fn changing_the_debounce_delay_keeps_a_pending_term() {
    let mut session = SearchSession::mount(None, MemoryStore::new());
    session.set_search_term("naruto");

    let mut session = session.with_debounce(TEST_DEBOUNCE);
    assert_eq!(session.search_term(), "naruto");
    assert_eq!(session.debounced_term(), "");

    session.tick().unwrap(); // mount settle
    sleep(SETTLE);
    let settle = session.tick().unwrap();
    assert_eq!(settle.term, "naruto");
    assert_eq!(session.debounced_term(), "naruto");
}

#[test]
fn file_store_round_trips_and_tolerates_corruption() {
    use hakken::session::FileStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = FileStore::open(path.clone());
    assert!(store.get(LAST_PAGE_KEY).is_none());
    store.set(LAST_PAGE_KEY, "7");
    store.set(LAST_ITEMS_PER_PAGE_KEY, "10");

    let reopened = FileStore::open(path.clone());
    assert_eq!(reopened.get(LAST_PAGE_KEY).as_deref(), Some("7"));
    assert_eq!(reopened.get(LAST_ITEMS_PER_PAGE_KEY).as_deref(), Some("10"));

    // a corrupt file degrades to an empty store
    std::fs::write(&path, "not json").unwrap();
    let corrupt = FileStore::open(path);
    assert!(corrupt.get(LAST_PAGE_KEY).is_none());
}

#[test]
fn query_key_switches_between_search_and_top() {
    let session = settled_session(Some("?q=bleach&page=2"), MemoryStore::new());
    assert_eq!(session.query_key(), QueryKey::search("bleach", 2, 20));

    let session = settled_session(None, store_with(&[(LAST_ITEMS_PER_PAGE_KEY, "10")]));
    assert_eq!(session.query_key(), QueryKey::top(1, 10));
}
