use serde::{Deserialize, Serialize};

/// Paging summary as reported by the backend. `page` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationInfo {
    /// The zeroed summary shown when a fetch fails.
    pub fn empty(requested_limit: usize) -> Self {
        Self {
            total: 0,
            page: 1,
            page_size: requested_limit.max(1),
            total_pages: 0,
            has_next_page: false,
            has_previous_page: false,
        }
    }

    pub fn from_total(total: usize, page_index: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total.div_ceil(page_size);
        Self {
            total,
            page: page_index.saturating_add(1),
            page_size,
            total_pages,
            has_next_page: page_index.saturating_add(1) < total_pages,
            has_previous_page: page_index > 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerTableResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> ServerTableResponse<T> {
    pub fn empty(requested_limit: usize) -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationInfo::empty(requested_limit),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Request sent to a data source. `filters` is flattened so its fields sit
/// next to `search`, `limit` and `offset`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerTableParams<F> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
    #[serde(flatten)]
    pub filters: F,
}

impl<F> ServerTableParams<F> {
    pub fn page_index(&self) -> usize {
        if self.limit == 0 { 0 } else { self.offset / self.limit }
    }
}

/// Filter type for sources that take no filters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct NoFilters {}

/// Filter option as served by the `/table/filters/*` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdName {
    pub id: i64,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pagination() {
        let empty = PaginationInfo::empty(25);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.page_size, 25);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }

    #[test]
    fn test_from_total() {
        let info = PaginationInfo::from_total(101, 0, 10);
        assert_eq!(info.total_pages, 11);
        assert_eq!(info.page, 1);
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);

        let last = PaginationInfo::from_total(101, 10, 10);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);
    }

    #[test]
    fn test_params_flatten_filters() {
        #[derive(Serialize)]
        struct Filters {
            statuses: Vec<i64>,
        }

        let params = ServerTableParams {
            search: None,
            limit: 10,
            offset: 20,
            filters: Filters {
                statuses: vec![1, 3],
            },
        };

        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("search").is_none());
        assert_eq!(json["statuses"], serde_json::json!([1, 3]));
        assert_eq!(json["offset"], 20);
        assert_eq!(params.page_index(), 2);
    }
}
