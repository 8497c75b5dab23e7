use ordered_float::OrderedFloat;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::domain::column::{Align, ColumnDescriptor, as_number, plain_text};
use crate::domain::query::{ColumnFilter, SortingRule, TableChange, TableQueryState};

/// Invoked with the full widget state after every effective change.
pub type ChangeCallback = Arc<dyn Fn(&TableChange) + Send + Sync>;

const PAGE_BUTTON_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// All rows are local; the widget filters, sorts and paginates them.
    Client,
    /// Rows arrive already filtered, sorted and paginated.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// User interactions the rendered widget emits.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    SetPageIndex(usize),
    SetPageSize(usize),
    ToggleSorting { column_id: String, multi: bool },
    SetGlobalFilter(String),
    SetColumnFilter { column_id: String, value: Option<Value> },
}

/// Internal state of the presentational table widget.
#[derive(Clone)]
pub struct DataTableState {
    mode: TableMode,
    initial_page_size: usize,
    state: TableQueryState,
    on_change: Option<ChangeCallback>,
    remount_key: Option<Arc<str>>,
}

impl fmt::Debug for DataTableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTableState")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("remount_key", &self.remount_key)
            .finish_non_exhaustive()
    }
}

impl DataTableState {
    pub fn client(initial_page_size: usize) -> Self {
        Self::new(TableMode::Client, initial_page_size)
    }

    pub fn manual(initial_page_size: usize) -> Self {
        Self::new(TableMode::Manual, initial_page_size)
    }

    fn new(mode: TableMode, initial_page_size: usize) -> Self {
        let state = TableQueryState::with_page_size(initial_page_size);
        Self {
            mode,
            initial_page_size: state.page_size,
            state,
            on_change: None,
            remount_key: None,
        }
    }

    pub fn with_on_change<C>(mut self, callback: C) -> Self
    where
        C: Fn(&TableChange) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn state(&self) -> &TableQueryState {
        &self.state
    }

    pub fn remount_key(&self) -> Option<&str> {
        self.remount_key.as_deref()
    }

    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        self.update(|state| state.page_index = page_index)
    }

    /// Keeps the first visible row on screen: the new page index is the one
    /// that contains the previous top row.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        self.update(|state| {
            let top_row = state.page_index.saturating_mul(state.page_size);
            state.page_size = page_size;
            state.page_index = top_row / page_size;
        })
    }

    /// Cycles a column through ascending, descending and unsorted. With
    /// `multi` the other sort rules are kept; otherwise the column becomes
    /// the only sort. Client mode returns to the first page.
    pub fn toggle_sorting(&mut self, column_id: &str, multi: bool) -> bool {
        let current = self.state.sort_for(column_id).map(|rule| rule.desc);
        let next = match current {
            None => Some(SortingRule::asc(column_id)),
            Some(false) => Some(SortingRule::desc(column_id)),
            Some(true) => None,
        };

        let reset = self.mode == TableMode::Client;
        self.update(|state| {
            let before = state.sorting.clone();
            if multi {
                match (state.sorting.iter().position(|rule| rule.column_id == column_id), next) {
                    (Some(index), Some(rule)) => state.sorting[index] = rule,
                    (Some(index), None) => {
                        state.sorting.remove(index);
                    }
                    (None, Some(rule)) => state.sorting.push(rule),
                    (None, None) => {}
                }
            } else {
                state.sorting = next.into_iter().collect();
            }
            if reset && state.sorting != before {
                state.page_index = 0;
            }
        })
    }

    pub fn set_sorting(&mut self, sorting: Vec<SortingRule>) -> bool {
        let reset = self.mode == TableMode::Client;
        self.update(|state| {
            if state.sorting != sorting {
                state.sorting = sorting;
                if reset {
                    state.page_index = 0;
                }
            }
        })
    }

    pub fn set_global_filter(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let reset = self.mode == TableMode::Client;
        self.update(|state| {
            if state.global_filter != text {
                state.global_filter = text;
                if reset {
                    state.page_index = 0;
                }
            }
        })
    }

    /// `None`, null and the empty string clear the column's filter.
    pub fn set_column_filter(&mut self, column_id: &str, value: Option<Value>) -> bool {
        let value = value.filter(|value| !value.is_null() && value.as_str() != Some(""));
        let reset = self.mode == TableMode::Client;
        self.update(|state| {
            let before = state.column_filters.clone();
            state.column_filters.retain(|filter| filter.column_id != column_id);
            if let Some(value) = value {
                state.column_filters.push(ColumnFilter {
                    column_id: column_id.to_string(),
                    value,
                });
            }
            if reset && state.column_filters != before {
                state.page_index = 0;
            }
        })
    }

    pub fn apply(&mut self, action: TableAction) -> bool {
        match action {
            TableAction::SetPageIndex(page_index) => self.set_page_index(page_index),
            TableAction::SetPageSize(page_size) => self.set_page_size(page_size),
            TableAction::ToggleSorting { column_id, multi } => self.toggle_sorting(&column_id, multi),
            TableAction::SetGlobalFilter(text) => self.set_global_filter(text),
            TableAction::SetColumnFilter { column_id, value } => {
                self.set_column_filter(&column_id, value)
            }
        }
    }

    /// Discards all internal state when `key` differs from the last one seen.
    pub fn remount(&mut self, key: &str) -> bool {
        if self.remount_key.as_deref() == Some(key) {
            return false;
        }
        self.remount_key = Some(Arc::from(key));
        let initial = self.initial_page_size;
        self.update(|state| *state = TableQueryState::with_page_size(initial));
        true
    }

    fn update(&mut self, change: impl FnOnce(&mut TableQueryState)) -> bool {
        let before = self.state.clone();
        change(&mut self.state);
        let changed = self.state != before;
        if changed {
            if let Some(callback) = &self.on_change {
                callback(&self.state);
            }
        }
        changed
    }

    /// Computes what the widget shows for `rows`.
    ///
    /// In client mode the page count always comes from the filtered rows and
    /// `page_count` is ignored. In manual mode rows are shown as given and
    /// `page_count` is used verbatim when present.
    ///
    /// The shown page index is clamped to the last page. Without a known
    /// page count (manual mode, no `page_count`) the stored index is shown.
    pub fn view(
        &self,
        rows: &[Value],
        columns: &[ColumnDescriptor],
        page_count: Option<usize>,
    ) -> TableView {
        let state = &self.state;
        let page_size = state.page_size.max(1);

        let (visible, page_count, page_index): (Vec<&Value>, usize, usize) = match self.mode {
            TableMode::Manual => {
                let derived = rows.len().div_ceil(page_size);
                let page_index = match page_count {
                    Some(count) => state.page_index.min(count.saturating_sub(1)),
                    None => state.page_index,
                };
                (rows.iter().collect(), page_count.unwrap_or(derived), page_index)
            }
            TableMode::Client => {
                let mut matching: Vec<&Value> = rows
                    .iter()
                    .filter(|row| matches_global(row, columns, &state.global_filter))
                    .filter(|row| matches_columns(row, &state.column_filters))
                    .collect();
                sort_rows(&mut matching, &state.sorting);

                let page_count = matching.len().div_ceil(page_size);
                let page_index = state.page_index.min(page_count.saturating_sub(1));
                let page = matching
                    .into_iter()
                    .skip(page_index.saturating_mul(page_size))
                    .take(page_size)
                    .collect();
                (page, page_count, page_index)
            }
        };

        let headers = columns
            .iter()
            .map(|column| HeaderView {
                id: column.id.clone(),
                label: column.header.clone(),
                align: column.align,
                sortable: column.sortable,
                sort: state.sort_for(&column.id).map(|rule| {
                    if rule.desc {
                        SortDirection::Desc
                    } else {
                        SortDirection::Asc
                    }
                }),
            })
            .collect();

        let rendered = visible
            .iter()
            .map(|row| columns.iter().map(|column| column.render_cell(row)).collect())
            .collect();

        TableView {
            headers,
            rows: rendered,
            page_index,
            page_size,
            page_count,
            can_previous: page_index > 0,
            can_next: page_index.saturating_add(1) < page_count,
            page_buttons: page_buttons(page_index, page_count),
            row_count: rows.len(),
            global_filter: state.global_filter.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub id: String,
    pub label: String,
    pub align: Align,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
}

/// Render-ready output of `DataTableState::view`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
    /// Zero-based page indices, at most five, centred on the current page.
    pub page_buttons: Vec<usize>,
    /// Rows handed to the widget, before client-side filtering.
    pub row_count: usize,
    pub global_filter: String,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One-based label for the footer, at least "of 1".
    pub fn page_label(&self) -> String {
        format!(
            "Page {} of {}",
            self.page_index.saturating_add(1),
            self.page_count.max(1)
        )
    }
}

fn page_buttons(page_index: usize, page_count: usize) -> Vec<usize> {
    (0..page_count.max(1))
        .skip(page_index.saturating_sub(2))
        .take(PAGE_BUTTON_WINDOW)
        .collect()
}

fn matches_global(row: &Value, columns: &[ColumnDescriptor], filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    columns.iter().any(|column| {
        column
            .value_of(row)
            .is_some_and(|value| plain_text(value).to_lowercase().contains(&needle))
    })
}

fn matches_columns(row: &Value, filters: &[ColumnFilter]) -> bool {
    filters.iter().all(|filter| {
        let cell = row.get(&filter.column_id).filter(|value| !value.is_null());
        match &filter.value {
            Value::Array(allowed) => cell.is_some_and(|value| allowed.contains(value)),
            Value::String(needle) => cell.is_some_and(|value| {
                plain_text(value)
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            }),
            expected => cell == Some(expected),
        }
    })
}

fn sort_rows(rows: &mut [&Value], sorting: &[SortingRule]) {
    if sorting.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        sorting
            .iter()
            .map(|rule| compare_cells(a.get(&rule.column_id), b.get(&rule.column_id), rule.desc))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Missing and null cells sort last in both directions. Two numbers (or
/// numeric strings) compare numerically, anything else case-insensitively.
fn compare_cells(a: Option<&Value>, b: Option<&Value>, desc: bool) -> Ordering {
    let a = a.filter(|value| !value.is_null());
    let b = b.filter(|value| !value.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = match (as_number(a), as_number(b)) {
                (Some(x), Some(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
                _ => plain_text(a)
                    .to_lowercase()
                    .cmp(&plain_text(b).to_lowercase()),
            };
            if desc { ordering.reverse() } else { ordering }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// One-based page number.
    Page(usize),
    StartEllipsis,
    EndEllipsis,
}

const SIBLING_COUNT: usize = 1;
const BOUNDARY_COUNT: usize = 1;

/// Numbered footer links for zero-based `page` out of `page_count`: the
/// first and last page, the current page with one neighbour on each side,
/// and ellipses for the gaps. Short ranges are listed in full.
pub fn pagination_items(page: usize, page_count: usize) -> Vec<PageItem> {
    let count = page_count.max(1);
    if count <= BOUNDARY_COUNT * 2 + SIBLING_COUNT * 2 + 3 {
        return (1..=count).map(PageItem::Page).collect();
    }

    let end_first = (count - BOUNDARY_COUNT + 1).max(BOUNDARY_COUNT + 1);
    let start = page
        .saturating_add(1)
        .saturating_sub(SIBLING_COUNT)
        .min(count - BOUNDARY_COUNT - SIBLING_COUNT * 2 - 1)
        .max(BOUNDARY_COUNT + 2);
    let end = page
        .saturating_add(1 + SIBLING_COUNT)
        .max(BOUNDARY_COUNT + SIBLING_COUNT * 2 + 2)
        .min(end_first - 2);

    let mut items: Vec<PageItem> = (1..=BOUNDARY_COUNT.min(count)).map(PageItem::Page).collect();

    if start > BOUNDARY_COUNT + 2 {
        items.push(PageItem::StartEllipsis);
    } else if start == BOUNDARY_COUNT + 2 {
        items.push(PageItem::Page(BOUNDARY_COUNT + 1));
    }

    items.extend((start..=end).map(PageItem::Page));

    if end + BOUNDARY_COUNT + 1 < count {
        items.push(PageItem::EndEllipsis);
    } else if end + BOUNDARY_COUNT + 1 == count {
        items.push(PageItem::Page(count - BOUNDARY_COUNT));
    }

    items.extend((end_first..=count).map(PageItem::Page));
    items.dedup();
    items
}
