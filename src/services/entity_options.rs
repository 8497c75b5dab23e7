use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::data_source::{SharedSource, fetch_or_empty};
use crate::domain::pagination::{IdName, NoFilters, ServerTableParams};

pub const DEFAULT_OPTIONS_PAGE_SIZE: usize = 50;

/// Dropdown options built from an `{id, value}` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub options: Vec<String>,
    pub value_to_id: HashMap<String, i64>,
}

impl FilterOptions {
    pub fn from_id_names(entries: &[IdName]) -> Self {
        Self {
            options: entries.iter().map(|entry| entry.value.clone()).collect(),
            value_to_id: entries
                .iter()
                .map(|entry| (entry.value.clone(), entry.id))
                .collect(),
        }
    }

    /// Ids for the selected display values, in selection order. Unknown
    /// values are dropped.
    pub fn ids_for(&self, selected: &[String]) -> Vec<i64> {
        selected
            .iter()
            .filter_map(|value| self.value_to_id.get(value).copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOption {
    pub value: String,
    pub label: String,
}

type Projection<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

struct LoadState<T> {
    items: Vec<T>,
    next_offset: Option<usize>,
    is_fetching: bool,
    loaded: bool,
}

/// Options for a long entity dropdown, loaded one page at a time as the
/// user scrolls.
pub struct InfiniteEntityOptions<T> {
    source: SharedSource<T, NoFilters>,
    page_size: usize,
    get_value: Projection<T>,
    get_label: Projection<T>,
    state: Mutex<LoadState<T>>,
}

impl<T> fmt::Debug for InfiniteEntityOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InfiniteEntityOptions")
            .field("page_size", &self.page_size)
            .field("loaded_items", &state.items.len())
            .field("next_offset", &state.next_offset)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> InfiniteEntityOptions<T> {
    pub fn new<V, L>(source: SharedSource<T, NoFilters>, get_value: V, get_label: L) -> Self
    where
        V: Fn(&T) -> String + Send + Sync + 'static,
        L: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            source,
            page_size: DEFAULT_OPTIONS_PAGE_SIZE,
            get_value: Arc::new(get_value),
            get_label: Arc::new(get_label),
            state: Mutex::new(LoadState {
                items: Vec::new(),
                next_offset: Some(0),
                is_fetching: false,
                loaded: false,
            }),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches the next page unless one is already in flight or the last
    /// page has been reached. Returns whether a page was fetched.
    pub async fn load_more(&self) -> bool {
        let offset = {
            let mut state = self.state.lock();
            if state.is_fetching {
                return false;
            }
            let Some(offset) = state.next_offset else {
                return false;
            };
            state.is_fetching = true;
            offset
        };

        let params = ServerTableParams {
            search: None,
            limit: self.page_size,
            offset,
            filters: NoFilters {},
        };
        let response = fetch_or_empty(self.source.as_ref(), &params).await;

        let mut state = self.state.lock();
        let pagination = &response.pagination;
        state.next_offset = pagination
            .has_next_page
            .then(|| pagination.page * pagination.page_size);
        state.items.extend(response.items);
        state.is_fetching = false;
        state.loaded = true;
        debug!(
            source = %self.source.name(),
            loaded = state.items.len(),
            next_offset = ?state.next_offset,
            "Loaded entity options page"
        );
        true
    }

    pub fn has_next_page(&self) -> bool {
        self.state.lock().next_offset.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().is_fetching
    }

    /// True until the first page has arrived.
    pub fn is_loading(&self) -> bool {
        !self.state.lock().loaded
    }

    pub fn all_items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    pub fn options(&self) -> Vec<EntityOption> {
        self.state
            .lock()
            .items
            .iter()
            .map(|item| EntityOption {
                value: (self.get_value)(item),
                label: (self.get_label)(item),
            })
            .collect()
    }

    /// Display label to API value. Later items win on duplicate labels.
    pub fn label_to_value(&self) -> HashMap<String, String> {
        self.state
            .lock()
            .items
            .iter()
            .map(|item| ((self.get_label)(item), (self.get_value)(item)))
            .collect()
    }
}
