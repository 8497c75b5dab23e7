use msm::services::{FilterState, SearchPhase, TableFilters};
use parking_lot::Mutex;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Records every distinct debounced value together with when it appeared.
fn record_debounced(filters: &TableFilters) -> Arc<Mutex<Vec<(String, Instant)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut updates = filters.subscribe();
    tokio::spawn(async move {
        let mut last = updates.borrow().debounced_search.clone();
        while updates.changed().await.is_ok() {
            let current = updates.borrow_and_update().debounced_search.clone();
            if current != last {
                sink.lock().push((current.clone(), Instant::now()));
                last = current;
            }
        }
    });
    seen
}

#[rstest]
#[case(vec!["s", "st", "ste", "stee", "steel"], 50)]
#[case(vec!["a", "ab"], 299)]
#[case(vec!["only"], 0)]
#[tokio::test(start_paused = true)]
async fn test_debounce_fires_once_with_last_value(#[case] inputs: Vec<&str>, #[case] gap_ms: u64) {
    let filters = TableFilters::new(10, Duration::from_millis(300));
    let seen = record_debounced(&filters);
    tokio::task::yield_now().await;

    let count = inputs.len();
    for (i, text) in inputs.iter().enumerate() {
        filters.set_search(*text);
        assert_eq!(filters.search(), *text);
        if i + 1 < count {
            sleep(Duration::from_millis(gap_ms)).await;
        }
    }
    let last_call = Instant::now();
    assert_eq!(filters.phase(), SearchPhase::SearchPending);

    sleep(Duration::from_millis(299)).await;
    assert_eq!(filters.debounced_search(), "");

    sleep(Duration::from_millis(2)).await;
    let last = *inputs.last().unwrap();
    assert_eq!(filters.debounced_search(), last);
    assert_eq!(filters.phase(), SearchPhase::Idle);

    // Long silence afterwards: still exactly one update
    sleep(Duration::from_secs(2)).await;
    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, last);
    assert_eq!(seen[0].1 - last_call, Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_only_one_timer_outstanding() {
    let filters = TableFilters::default();
    for i in 0..100 {
        filters.set_search(format!("query {i}"));
    }
    sleep(Duration::from_millis(301)).await;
    assert_eq!(filters.debounced_search(), "query 99");
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_cancels_timer() {
    let filters = TableFilters::default();
    let mut updates = filters.subscribe();
    filters.set_search("gone");
    drop(filters);

    sleep(Duration::from_secs(1)).await;
    // the sender is gone and the pending value never landed
    assert_eq!(updates.borrow_and_update().debounced_search, "");
    assert!(updates.changed().await.is_err());
}

#[rstest]
#[case(vec![], vec![])]
#[case(vec![1, 2], vec![1, 2])]
#[case(vec![1], vec![3, 4])]
fn test_filter_setter_always_resets_page(#[case] initial: Vec<i64>, #[case] next: Vec<i64>) {
    let table = TableFilters::default();
    let statuses = FilterState::new(initial, table.page_resetter());

    table.set_page_index(5);
    statuses.set(next.clone());

    assert_eq!(table.page_index(), 0);
    assert_eq!(statuses.get(), next);
}

#[test]
fn test_filter_update_resets_page() {
    let table = TableFilters::default();
    let search_scope = FilterState::new("all".to_string(), table.page_resetter());

    table.set_page_index(2);
    search_scope.update(|current| format!("{current}-active"));

    assert_eq!(table.page_index(), 0);
    assert_eq!(search_scope.get(), "all-active");
}

#[test]
fn test_page_size_then_filter_reset() {
    let table = TableFilters::default();
    let filter = FilterState::new(String::new(), table.page_resetter());

    table.set_page_size(25);
    table.set_page_index(3);
    filter.set("Steel".to_string());

    assert_eq!(table.page_index(), 0);
    assert_eq!(table.page_size(), 25);
}
