use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the sort order. The first rule in a list is the primary sort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortingRule {
    pub column_id: String,
    pub desc: bool,
}

impl SortingRule {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            desc: false,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            desc: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    pub column_id: String,
    pub value: Value,
}

/// Pagination, sort and filter state of one table instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableQueryState {
    pub page_index: usize,
    pub page_size: usize,
    pub sorting: Vec<SortingRule>,
    pub global_filter: String,
    pub column_filters: Vec<ColumnFilter>,
}

/// What the widget reports through its change callback.
pub type TableChange = TableQueryState;

pub const DEFAULT_PAGE_SIZE: usize = 10;

impl Default for TableQueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl TableQueryState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sorting: Vec::new(),
            global_filter: String::new(),
            column_filters: Vec::new(),
        }
    }

    pub fn sort_for(&self, column_id: &str) -> Option<&SortingRule> {
        self.sorting.iter().find(|rule| rule.column_id == column_id)
    }

    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}
