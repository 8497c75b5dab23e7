use msm::domain::inventory::InventoryFilters;
use msm::domain::pagination::PaginationInfo;
use msm::domain::query::TableQueryState;
use msm::services::data_source::mock::MockTableSource;
use msm::services::{FilterState, RefreshOutcome, ServerTable, ServerTableOptions};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn rows(tag: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"partNumber": format!("{tag}-{i}"), "totalStock": i}))
        .collect()
}

fn inventory_table(source: &MockTableSource<Value, InventoryFilters>) -> Arc<ServerTable<Value, InventoryFilters>> {
    Arc::new(ServerTable::new(
        Arc::new(source.clone()),
        ServerTableOptions::new("inventory-list", InventoryFilters::default()),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_never_overwrites_newer_page() {
    // R1 (page 0) is slow, R2 (page 1) answers first
    let source = MockTableSource::new();
    source.respond_page(0, rows("R1", 10), 40, 200);
    source.respond_page(1, rows("R2", 10), 40, 50);
    let table = inventory_table(&source);

    let (first, second) = futures::join!(table.refresh(), async {
        table.set_page_index(1);
        table.refresh().await
    });

    assert_eq!(second, RefreshOutcome::Applied);
    assert_eq!(first, RefreshOutcome::Stale);

    let snapshot = table.snapshot();
    assert_eq!(snapshot.page_index, 1);
    assert_eq!(snapshot.rows[0]["partNumber"], "R2-0");
    assert_eq!(snapshot.page_count, 4);
    assert_eq!(snapshot.total_records, 40);
    assert!(!snapshot.is_fetching);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_old_page_is_discarded() {
    let source = MockTableSource::new();
    source.respond_page(0, rows("R1", 10), 40, 50);
    source.respond_page(1, rows("R2", 10), 40, 10);
    let table = inventory_table(&source);

    let slow = {
        let table = Arc::clone(&table);
        tokio::spawn(async move { table.refresh().await })
    };
    tokio::task::yield_now().await;

    table.set_page_index(1);
    assert_eq!(table.refresh().await, RefreshOutcome::Applied);
    assert_eq!(slow.await.unwrap(), RefreshOutcome::Stale);

    // R1 arrived last but the screen still shows R2
    let snapshot = table.snapshot();
    assert_eq!(snapshot.rows[0]["partNumber"], "R2-0");
    assert_eq!(snapshot.page_index, 1);
}

#[tokio::test]
async fn test_failing_source_renders_empty_page() {
    let source = MockTableSource::new();
    source.fail_unscripted("502 Bad Gateway");
    let table = inventory_table(&source);
    table.set_page_size(25);

    assert_eq!(table.refresh().await, RefreshOutcome::Applied);

    let snapshot = table.snapshot();
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.pagination, Some(PaginationInfo::empty(25)));
    assert_eq!(snapshot.page_count, 0);
    assert_eq!(snapshot.total_records, 0);
    assert!(!snapshot.is_loading);
}

#[test]
fn test_filter_reset_keeps_page_size() {
    let source = MockTableSource::new();
    let table = inventory_table(&source);

    table.set_page_size(25);
    table.set_page_index(3);
    let statuses = FilterState::new(Vec::<i64>::new(), table.page_resetter());
    statuses.set(vec![2]);

    let state = table.controls().state();
    assert_eq!(state.page_index, 0);
    assert_eq!(state.page_size, 25);
}

#[tokio::test(start_paused = true)]
async fn test_cached_page_shows_while_refetching() {
    let source = MockTableSource::new();
    source.respond_page(0, rows("P0", 10), 20, 100);
    source.respond_page(1, rows("P1", 10), 20, 100);
    let table = inventory_table(&source);

    table.refresh().await;
    table.set_page_index(1);
    table.refresh().await;
    table.set_page_index(0);

    let (outcome, during) = futures::join!(table.refresh(), async {
        tokio::task::yield_now().await;
        table.snapshot()
    });

    assert!(during.is_fetching);
    assert_eq!(during.page_index, 0);
    assert_eq!(during.rows[0]["partNumber"], "P0-0");
    assert_eq!(outcome, RefreshOutcome::Applied);
    assert!(!table.snapshot().is_fetching);
}

#[tokio::test(start_paused = true)]
async fn test_run_fetches_once_per_settled_search() {
    let source = MockTableSource::new();
    source.respond_page(0, rows("S", 3), 3, 0);
    let table = inventory_table(&source);
    let runner = tokio::spawn(Arc::clone(&table).run());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(source.calls().len(), 1);

    // Keystrokes 100ms apart never settle
    for text in ["b", "bo", "bol", "bolt"] {
        table.set_search(text);
        sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(source.calls().len(), 1);

    sleep(Duration::from_millis(250)).await;
    let calls = source.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].search.as_deref(), Some("bolt"));
    assert_eq!(calls[1].offset, 0);

    runner.abort();
}

#[tokio::test(start_paused = true)]
async fn test_run_refetches_on_filters_and_paging() {
    let source = MockTableSource::new();
    source.respond_page(0, rows("A", 10), 30, 0);
    source.respond_page(2, rows("C", 10), 30, 0);
    let table = inventory_table(&source);
    let runner = tokio::spawn(Arc::clone(&table).run());
    sleep(Duration::from_millis(10)).await;

    let mut change = TableQueryState::with_page_size(10);
    change.page_index = 2;
    table.apply_table_change(&change);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(table.snapshot().rows[0]["partNumber"], "C-0");

    table.set_filters(InventoryFilters {
        status_ids: vec![2],
        ..Default::default()
    });
    sleep(Duration::from_millis(10)).await;

    let calls = source.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].offset, 20);
    assert_eq!(calls[2].offset, 0);
    assert_eq!(calls[2].filters, json!({"statuses": [2]}));
    assert_eq!(table.snapshot().page_index, 0);

    runner.abort();
}

#[tokio::test(start_paused = true)]
async fn test_table_key_follows_debounced_search() {
    let source = MockTableSource::new();
    source.respond_page(0, rows("K", 1), 1, 0);
    let table = inventory_table(&source);
    let before = table.table_key();

    table.set_search("flange");
    assert!(Arc::ptr_eq(&before, &table.table_key()));

    sleep(Duration::from_millis(301)).await;
    let after = table.table_key();
    assert_ne!(before, after);
    assert!(after.contains("\"flange\""));

    table.refresh().await;
    assert_eq!(table.snapshot().table_key, after);
    assert_eq!(table.snapshot().search, "flange");
}
