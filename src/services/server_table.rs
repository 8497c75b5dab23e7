use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::data_source::{SharedSource, fetch_or_empty};
use super::error_handling::LogHelper;
use super::filter_state::ResetPage;
use super::table_filters::{DEFAULT_DEBOUNCE, TableFilters};
use super::table_key::{TableKeyMemo, compute_table_key};
use crate::domain::pagination::{PaginationInfo, ServerTableParams, ServerTableResponse};
use crate::domain::query::{DEFAULT_PAGE_SIZE, TableQueryState};

const RESPONSE_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ServerTableOptions<F> {
    pub query_key: String,
    pub filters: F,
    pub initial_page_size: usize,
    pub debounce: Duration,
    pub enabled: bool,
}

impl<F> ServerTableOptions<F> {
    pub fn new(query_key: impl Into<String>, filters: F) -> Self {
        Self {
            query_key: query_key.into(),
            filters,
            initial_page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            enabled: true,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.initial_page_size = page_size;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// What the table view renders: the rows of the last applied response and the
/// parameters they were fetched with.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot<I> {
    pub rows: Vec<I>,
    pub pagination: Option<PaginationInfo>,
    pub page_count: usize,
    pub total_records: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub search: String,
    pub table_key: Arc<str>,
    pub is_loading: bool,
    pub is_fetching: bool,
}

impl<I> TableSnapshot<I> {
    fn initial(page_size: usize, table_key: Arc<str>, enabled: bool) -> Self {
        Self {
            rows: Vec::new(),
            pagination: None,
            page_count: 1,
            total_records: 0,
            page_index: 0,
            page_size,
            search: String::new(),
            table_key,
            is_loading: enabled,
            is_fetching: false,
        }
    }

    fn apply(&mut self, response: ServerTableResponse<I>, page_index: usize, page_size: usize, search: String) {
        self.page_count = response.pagination.total_pages;
        self.total_records = response.pagination.total;
        self.pagination = Some(response.pagination);
        self.rows = response.items;
        self.page_index = page_index;
        self.page_size = page_size;
        self.search = search;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Newer parameters were requested while this fetch was in flight.
    Stale,
    Disabled,
}

struct ResponseCache<I> {
    entries: HashMap<String, ServerTableResponse<I>>,
    order: VecDeque<String>,
}

impl<I: Clone> ResponseCache<I> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<ServerTableResponse<I>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, response: ServerTableResponse<I>) {
        if self.entries.insert(key.clone(), response).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > RESPONSE_CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Server-synchronized table: pagination and debounced search from
/// `TableFilters`, caller filters, and a data source, kept consistent with
/// what is on screen.
///
/// Every request is keyed by its full parameter tuple. A response is only
/// shown if its key is still the latest one requested, so a slow response for
/// old parameters never replaces newer rows.
pub struct ServerTable<I, F> {
    query_key: String,
    source: SharedSource<I, F>,
    controls: TableFilters,
    filters: watch::Sender<F>,
    enabled: bool,
    key_memo: Mutex<TableKeyMemo>,
    latest_request: Mutex<Option<String>>,
    cache: Mutex<ResponseCache<I>>,
    snapshot: watch::Sender<TableSnapshot<I>>,
}

impl<I, F> ServerTable<I, F>
where
    I: Clone + Send + Sync + 'static,
    F: Serialize + Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(source: SharedSource<I, F>, options: ServerTableOptions<F>) -> Self {
        let controls = TableFilters::new(options.initial_page_size, options.debounce);
        let mut key_memo = TableKeyMemo::new();
        let table_key = key_memo.key(&dependency_record("", &options.filters));
        let (snapshot, _) = watch::channel(TableSnapshot::initial(
            controls.page_size(),
            table_key,
            options.enabled,
        ));
        let (filters, _) = watch::channel(options.filters);

        Self {
            query_key: options.query_key,
            source,
            controls,
            filters,
            enabled: options.enabled,
            key_memo: Mutex::new(key_memo),
            latest_request: Mutex::new(None),
            cache: Mutex::new(ResponseCache::new()),
            snapshot,
        }
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn controls(&self) -> &TableFilters {
        &self.controls
    }

    pub fn filters(&self) -> F {
        self.filters.borrow().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Back to the first page, then a new (debounced) search.
    pub fn set_search(&self, text: impl Into<String>) {
        self.controls.reset_page();
        self.controls.set_search(text);
    }

    pub fn set_page_index(&self, page_index: usize) {
        self.controls.set_page_index(page_index);
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.controls.set_page_size(page_size);
    }

    pub fn reset_page(&self) {
        self.controls.reset_page();
    }

    pub fn page_resetter(&self) -> ResetPage {
        self.controls.page_resetter()
    }

    /// Replaces the caller filters. A different value sends the table back to
    /// its first page.
    pub fn set_filters(&self, next: F) {
        if *self.filters.borrow() == next {
            return;
        }
        self.controls.reset_page();
        self.filters.send_replace(next);
    }

    /// Copies the page position reported by the widget's change callback.
    pub fn apply_table_change(&self, change: &TableQueryState) {
        self.controls.set_page_size(change.page_size);
        self.controls.set_page_index(change.page_index);
    }

    pub fn params(&self) -> ServerTableParams<F> {
        let state = self.controls.state();
        let search = (!state.debounced_search.is_empty()).then_some(state.debounced_search);
        ServerTableParams {
            search,
            limit: state.page_size,
            offset: state.page_index.saturating_mul(state.page_size),
            filters: self.filters.borrow().clone(),
        }
    }

    /// Identity of a request: query key plus search, filters, page index and
    /// page size.
    pub fn request_key(&self, params: &ServerTableParams<F>) -> String {
        let mut record = dependency_record(params.search.as_deref().unwrap_or(""), &params.filters);
        record.insert("pageIndex".to_string(), Value::from(params.page_index()));
        record.insert("pageSize".to_string(), Value::from(params.limit));
        format!("{}#{}", self.query_key, compute_table_key(&record))
    }

    /// Remount key for the widget, derived from the debounced search and the
    /// caller filters. Stable while those are unchanged.
    pub fn table_key(&self) -> Arc<str> {
        let record = dependency_record(&self.controls.debounced_search(), &*self.filters.borrow());
        self.key_memo.lock().key(&record)
    }

    pub fn snapshot(&self) -> TableSnapshot<I> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot<I>> {
        self.snapshot.subscribe()
    }

    /// Fetches the page for the current parameters. Previous rows stay
    /// visible (or a cached response for the same key is shown) while the
    /// request is in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.enabled {
            return RefreshOutcome::Disabled;
        }

        let params = self.params();
        let request_key = self.request_key(&params);
        let table_key = self.table_key();
        let page_index = params.page_index();
        let search = params.search.clone().unwrap_or_default();

        *self.latest_request.lock() = Some(request_key.clone());
        let cached = self.cache.lock().get(&request_key);
        self.snapshot.send_modify(|snapshot| {
            snapshot.is_fetching = true;
            snapshot.table_key = Arc::clone(&table_key);
            if let Some(cached) = cached {
                snapshot.apply(cached, page_index, params.limit, search.clone());
            }
        });

        debug!(
            query_key = %self.query_key,
            request_key = %request_key,
            page_index = page_index,
            page_size = params.limit,
            "Fetching table page"
        );
        let response = fetch_or_empty(self.source.as_ref(), &params).await;
        self.cache.lock().insert(request_key.clone(), response.clone());

        let latest = self.latest_request.lock();
        if latest.as_deref() != Some(request_key.as_str()) {
            LogHelper::log_stale_response(&self.query_key, &request_key);
            return RefreshOutcome::Stale;
        }
        self.snapshot.send_modify(|snapshot| {
            snapshot.apply(response, page_index, params.limit, search);
            snapshot.table_key = table_key;
            snapshot.is_fetching = false;
            snapshot.is_loading = false;
        });
        RefreshOutcome::Applied
    }

    /// Refreshes whenever the request parameters change. Raw keystrokes that
    /// have not settled through the debounce do not change the parameters and
    /// do not fetch. Runs until the surrounding task is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut controls = self.controls.subscribe();
        let mut filters = self.filters.subscribe();
        let mut last_request: Option<String> = None;

        loop {
            let request_key = self.request_key(&self.params());
            if last_request.as_deref() != Some(request_key.as_str()) {
                last_request = Some(request_key);
                let table = Arc::clone(&self);
                tokio::spawn(async move {
                    table.refresh().await;
                });
            }

            tokio::select! {
                changed = controls.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = filters.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// `{search, ...filters}` as a JSON record for key derivation.
fn dependency_record<F: Serialize>(search: &str, filters: &F) -> Map<String, Value> {
    let mut record = match serde_json::to_value(filters) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            let mut map = Map::new();
            map.insert("filters".to_string(), other);
            map
        }
        Err(error) => {
            warn!(error = %error, "Table filters could not be serialized");
            Map::new()
        }
    };
    record.insert("search".to_string(), Value::String(search.to_owned()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::InventoryFilters;
    use crate::services::data_source::mock::MockTableSource;

    fn table(source: MockTableSource<u32, InventoryFilters>) -> ServerTable<u32, InventoryFilters> {
        ServerTable::new(
            Arc::new(source),
            ServerTableOptions::new("inventory-list", InventoryFilters::default()),
        )
    }

    #[test]
    fn test_initial_snapshot() {
        let table = table(MockTableSource::new());
        let snapshot = table.snapshot();
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.page_count, 1);
        assert_eq!(snapshot.total_records, 0);
        assert!(snapshot.is_loading);
        assert!(!snapshot.is_fetching);
    }

    #[test]
    fn test_params_from_state() {
        let table = table(MockTableSource::new());
        table.set_page_size(25);
        table.set_page_index(3);

        let params = table.params();
        assert_eq!(params.search, None);
        assert_eq!(params.limit, 25);
        assert_eq!(params.offset, 75);
    }

    #[test]
    fn test_request_key_covers_every_parameter() {
        let table = table(MockTableSource::new());
        let base = table.request_key(&table.params());

        table.set_page_index(1);
        let paged = table.request_key(&table.params());
        assert_ne!(base, paged);

        table.set_filters(InventoryFilters {
            status_ids: vec![4],
            ..Default::default()
        });
        let filtered = table.request_key(&table.params());
        assert_ne!(paged, filtered);
        assert!(filtered.starts_with("inventory-list#"));
    }

    #[test]
    fn test_table_key_is_stable_until_filters_change() {
        let table = table(MockTableSource::new());
        let first = table.table_key();
        table.set_page_index(2);
        assert!(Arc::ptr_eq(&first, &table.table_key()));

        table.set_filters(InventoryFilters {
            product_type_ids: vec![1],
            ..Default::default()
        });
        assert!(!Arc::ptr_eq(&first, &table.table_key()));
        assert_eq!(table.controls().page_index(), 0);
    }

    #[test]
    fn test_equal_filters_keep_page() {
        let table = table(MockTableSource::new());
        table.set_page_index(2);
        table.set_filters(InventoryFilters::default());
        assert_eq!(table.controls().page_index(), 2);
    }

    #[tokio::test]
    async fn test_disabled_table_does_not_fetch() {
        let source = MockTableSource::<u32, InventoryFilters>::new();
        let table = ServerTable::new(
            Arc::new(source.clone()),
            ServerTableOptions::new("inventory-list", InventoryFilters::default()).enabled(false),
        );

        assert_eq!(table.refresh().await, RefreshOutcome::Disabled);
        assert!(source.calls().is_empty());
        assert!(!table.snapshot().is_loading);
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let mut cache = ResponseCache::<u32>::new();
        for i in 0..=RESPONSE_CACHE_CAPACITY {
            cache.insert(format!("k{i}"), ServerTableResponse::empty(10));
        }
        assert!(cache.get("k0").is_none());
        assert!(cache.get(&format!("k{RESPONSE_CACHE_CAPACITY}")).is_some());
    }
}
