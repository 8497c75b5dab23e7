use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use super::debounce::Debouncer;
use super::filter_state::ResetPage;
use crate::domain::query::DEFAULT_PAGE_SIZE;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No debounce timer outstanding.
    Idle,
    /// A keystroke arrived and the debounced value has not caught up yet.
    SearchPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFiltersState {
    pub page_index: usize,
    pub page_size: usize,
    pub search: String,
    pub debounced_search: String,
    pub phase: SearchPhase,
}

/// Page index, page size and debounced search of one table view.
///
/// Cheap to clone; clones share state. The debounce timer is cancelled when
/// the last clone is dropped.
#[derive(Clone)]
pub struct TableFilters {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<TableFiltersState>,
    debouncer: Debouncer,
    search_generation: AtomicU64,
}

impl Default for TableFilters {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_DEBOUNCE)
    }
}

impl TableFilters {
    /// A page size of zero is treated as one.
    pub fn new(initial_page_size: usize, debounce: Duration) -> Self {
        let (state, _) = watch::channel(TableFiltersState {
            page_index: 0,
            page_size: initial_page_size.max(1),
            search: String::new(),
            debounced_search: String::new(),
            phase: SearchPhase::Idle,
        });
        Self {
            inner: Arc::new(Inner {
                state,
                debouncer: Debouncer::new(debounce),
                search_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> TableFiltersState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TableFiltersState> {
        self.inner.state.subscribe()
    }

    pub fn page_index(&self) -> usize {
        self.inner.state.borrow().page_index
    }

    pub fn page_size(&self) -> usize {
        self.inner.state.borrow().page_size
    }

    pub fn search(&self) -> String {
        self.inner.state.borrow().search.clone()
    }

    pub fn debounced_search(&self) -> String {
        self.inner.state.borrow().debounced_search.clone()
    }

    pub fn phase(&self) -> SearchPhase {
        self.inner.state.borrow().phase
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debouncer.delay()
    }

    /// Updates the raw search right away and the debounced search once the
    /// input has been quiet for the debounce delay.
    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.inner.state.send_modify(|state| {
            state.search = text.clone();
            state.phase = SearchPhase::SearchPending;
        });

        if self.inner.debouncer.delay().is_zero() {
            self.inner.settle_search(generation, text);
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let settle = move || {
            if let Some(inner) = weak.upgrade() {
                inner.settle_search(generation, text);
            }
        };
        if let Err(settle) = self.inner.debouncer.schedule(settle) {
            debug!("No runtime for the search debounce timer, applying immediately");
            settle();
        }
    }

    /// Stores `page_index` as given; clamping against the page count is the
    /// widget's job.
    pub fn set_page_index(&self, page_index: usize) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.page_index != page_index;
            state.page_index = page_index;
            changed
        });
    }

    /// Leaves the page index alone. Pair with `reset_page` when needed.
    pub fn set_page_size(&self, page_size: usize) {
        let page_size = page_size.max(1);
        self.inner.state.send_if_modified(|state| {
            let changed = state.page_size != page_size;
            state.page_size = page_size;
            changed
        });
    }

    pub fn reset_page(&self) {
        self.set_page_index(0);
    }

    /// A callback that resets this table to its first page, for `FilterState`.
    pub fn page_resetter(&self) -> ResetPage {
        let filters = self.clone();
        Arc::new(move || filters.reset_page())
    }
}

impl Inner {
    fn settle_search(&self, generation: u64, text: String) {
        let generation_now = &self.search_generation;
        self.state.send_if_modified(|state| {
            // a newer keystroke owns the timer now
            if generation_now.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.phase = SearchPhase::Idle;
            state.debounced_search = text;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let filters = TableFilters::default();
        let state = filters.state();
        assert_eq!(state.page_index, 0);
        assert_eq!(state.page_size, 10);
        assert_eq!(state.search, "");
        assert_eq!(state.debounced_search, "");
        assert_eq!(state.phase, SearchPhase::Idle);
        assert_eq!(filters.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_non_positive_page_size_is_clamped() {
        let filters = TableFilters::new(0, DEFAULT_DEBOUNCE);
        assert_eq!(filters.page_size(), 1);

        filters.set_page_size(0);
        assert_eq!(filters.page_size(), 1);
    }

    #[test]
    fn test_page_size_does_not_reset_page() {
        let filters = TableFilters::default();
        filters.set_page_index(4);
        filters.set_page_size(50);
        assert_eq!(filters.page_index(), 4);
        assert_eq!(filters.page_size(), 50);

        filters.reset_page();
        filters.reset_page();
        assert_eq!(filters.page_index(), 0);
    }

    #[test]
    fn test_page_index_is_not_validated() {
        let filters = TableFilters::default();
        filters.set_page_index(9_999);
        assert_eq!(filters.page_index(), 9_999);
    }

    #[test]
    fn test_zero_delay_settles_synchronously() {
        let filters = TableFilters::new(10, Duration::ZERO);
        filters.set_search("bolt");
        assert_eq!(filters.debounced_search(), "bolt");
        assert_eq!(filters.phase(), SearchPhase::Idle);
    }

    #[test]
    fn test_without_runtime_search_applies_immediately() {
        let filters = TableFilters::default();
        filters.set_search("washer");
        assert_eq!(filters.search(), "washer");
        assert_eq!(filters.debounced_search(), "washer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_settles_after_quiet_period() {
        let filters = TableFilters::default();
        filters.set_search("nut");
        assert_eq!(filters.search(), "nut");
        assert_eq!(filters.debounced_search(), "");
        assert_eq!(filters.phase(), SearchPhase::SearchPending);

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(filters.debounced_search(), "nut");
        assert_eq!(filters.phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_resetter_resets_shared_state() {
        let filters = TableFilters::default();
        filters.set_page_index(3);
        let reset = filters.page_resetter();
        reset();
        assert_eq!(filters.page_index(), 0);
    }
}
