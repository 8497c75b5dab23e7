use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::error_handling::{LogHelper, Result};
use crate::domain::pagination::{PaginationInfo, ServerTableParams, ServerTableResponse};

/// Remote or local row source behind a server-synchronized table.
#[async_trait]
pub trait TableDataSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;
    type Filters: Serialize + Clone + PartialEq + Send + Sync + 'static;

    async fn fetch(
        &self,
        params: &ServerTableParams<Self::Filters>,
    ) -> Result<ServerTableResponse<Self::Item>>;

    /// Label used in logs.
    fn name(&self) -> &str {
        "data-source"
    }
}

pub type SharedSource<I, F> = Arc<dyn TableDataSource<Item = I, Filters = F>>;

/// Fetches a page, turning every failure into an empty page with zeroed
/// pagination. Callers never see an error.
pub async fn fetch_or_empty<S>(
    source: &S,
    params: &ServerTableParams<S::Filters>,
) -> ServerTableResponse<S::Item>
where
    S: TableDataSource + ?Sized,
{
    match source.fetch(params).await {
        Ok(response) => response,
        Err(error) => {
            LogHelper::log_fetch_failure(source.name(), params.limit, params.offset, &error);
            ServerTableResponse::empty(params.limit)
        }
    }
}

type RowPredicate<F> = Arc<dyn Fn(&Value, &F) -> bool + Send + Sync>;

/// Rows held in memory, searched, filtered and paged the way the backend
/// would. Backs mock mode and tests.
pub struct InMemorySource<F> {
    name: String,
    rows: Vec<Value>,
    predicate: RowPredicate<F>,
}

impl<F: 'static> InMemorySource<F> {
    pub fn new<P>(name: impl Into<String>, rows: Vec<Value>, predicate: P) -> Self
    where
        P: Fn(&Value, &F) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            rows,
            predicate: Arc::new(predicate),
        }
    }

    pub fn unfiltered(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self::new(name, rows, |_: &Value, _: &F| true)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl<F> TableDataSource for InMemorySource<F>
where
    F: Serialize + Clone + PartialEq + Send + Sync + 'static,
{
    type Item = Value;
    type Filters = F;

    async fn fetch(&self, params: &ServerTableParams<F>) -> Result<ServerTableResponse<Value>> {
        let needle = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<&Value> = self
            .rows
            .iter()
            .filter(|row| needle.as_deref().is_none_or(|n| row_contains(row, n)))
            .filter(|row| (self.predicate)(*row, &params.filters))
            .collect();

        let limit = params.limit.max(1);
        let items = matching
            .iter()
            .skip(params.offset)
            .take(limit)
            .map(|row| (*row).clone())
            .collect();

        Ok(ServerTableResponse {
            items,
            pagination: PaginationInfo::from_total(matching.len(), params.offset / limit, limit),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive substring match over the top-level string and number
/// fields of `row`. `needle` must already be lowercase.
pub fn row_contains(row: &Value, needle: &str) -> bool {
    match row {
        Value::Object(fields) => fields.values().any(|value| scalar_contains(value, needle)),
        other => scalar_contains(other, needle),
    }
}

fn scalar_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Number(number) => number.to_string().contains(needle),
        _ => false,
    }
}

pub mod mock {
    use super::*;
    use crate::services::error_handling::MsmError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::marker::PhantomData;
    use tokio::time::{Duration, sleep};

    #[derive(Debug, Clone)]
    enum Scripted<T> {
        Page { items: Vec<T>, total: usize },
        Failure(String),
    }

    #[derive(Debug, Clone)]
    struct MockResponse<T> {
        outcome: Scripted<T>,
        delay_ms: u64,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct MockCall {
        pub search: Option<String>,
        pub limit: usize,
        pub offset: usize,
        pub filters: Value,
    }

    /// Scripted responses keyed by page index, each with its own delay so
    /// tests can make requests resolve out of order.
    pub struct MockTableSource<T, F> {
        responses: Arc<Mutex<HashMap<usize, MockResponse<T>>>>,
        fallback: Arc<Mutex<Option<MockResponse<T>>>>,
        call_history: Arc<Mutex<Vec<MockCall>>>,
        _filters: PhantomData<fn() -> F>,
    }

    impl<T, F> Clone for MockTableSource<T, F> {
        fn clone(&self) -> Self {
            Self {
                responses: Arc::clone(&self.responses),
                fallback: Arc::clone(&self.fallback),
                call_history: Arc::clone(&self.call_history),
                _filters: PhantomData,
            }
        }
    }

    impl<T, F> Default for MockTableSource<T, F> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T, F> MockTableSource<T, F> {
        pub fn new() -> Self {
            Self {
                responses: Arc::new(Mutex::new(HashMap::new())),
                fallback: Arc::new(Mutex::new(None)),
                call_history: Arc::new(Mutex::new(Vec::new())),
                _filters: PhantomData,
            }
        }

        pub fn respond_page(&self, page_index: usize, items: Vec<T>, total: usize, delay_ms: u64) {
            self.responses.lock().insert(
                page_index,
                MockResponse {
                    outcome: Scripted::Page { items, total },
                    delay_ms,
                },
            );
        }

        pub fn fail_page(&self, page_index: usize, message: &str, delay_ms: u64) {
            self.responses.lock().insert(
                page_index,
                MockResponse {
                    outcome: Scripted::Failure(message.to_string()),
                    delay_ms,
                },
            );
        }

        /// Failure for every page without a scripted response.
        pub fn fail_unscripted(&self, message: &str) {
            *self.fallback.lock() = Some(MockResponse {
                outcome: Scripted::Failure(message.to_string()),
                delay_ms: 0,
            });
        }

        pub fn calls(&self) -> Vec<MockCall> {
            self.call_history.lock().clone()
        }
    }

    #[async_trait]
    impl<T, F> TableDataSource for MockTableSource<T, F>
    where
        T: Clone + Send + Sync + 'static,
        F: Serialize + Clone + PartialEq + Send + Sync + 'static,
    {
        type Item = T;
        type Filters = F;

        async fn fetch(&self, params: &ServerTableParams<F>) -> Result<ServerTableResponse<T>> {
            self.call_history.lock().push(MockCall {
                search: params.search.clone(),
                limit: params.limit,
                offset: params.offset,
                filters: serde_json::to_value(&params.filters)?,
            });

            let page_index = params.page_index();
            let scripted = self
                .responses
                .lock()
                .get(&page_index)
                .cloned()
                .or_else(|| self.fallback.lock().clone());

            let Some(response) = scripted else {
                return Err(MsmError::source_failure(format!(
                    "no scripted response for page {page_index}"
                )));
            };

            if response.delay_ms > 0 {
                sleep(Duration::from_millis(response.delay_ms)).await;
            }

            match response.outcome {
                Scripted::Page { items, total } => Ok(ServerTableResponse {
                    items,
                    pagination: PaginationInfo::from_total(total, page_index, params.limit),
                }),
                Scripted::Failure(message) => Err(MsmError::source_failure(message)),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}
