pub mod data_source;
pub mod debounce;
pub mod entity_options;
pub mod error_handling;
pub mod filter_state;
pub mod http_client;
pub mod server_table;
pub mod session;
pub mod table_filters;
pub mod table_key;
pub mod table_model;

pub use data_source::{InMemorySource, SharedSource, TableDataSource, fetch_or_empty};
pub use debounce::Debouncer;
pub use entity_options::{EntityOption, FilterOptions, InfiniteEntityOptions};
pub use error_handling::{MsmError, Result};
pub use filter_state::{FilterState, ResetPage};
pub use http_client::{ApiClient, Backend, HttpTableSource};
pub use server_table::{RefreshOutcome, ServerTable, ServerTableOptions, TableSnapshot};
pub use session::{LogOtpSender, OtpSender, SessionHandle, SessionState};
pub use table_filters::{SearchPhase, TableFilters, TableFiltersState};
pub use table_key::{TableKeyMemo, compute_table_key};
pub use table_model::{DataTableState, PageItem, TableAction, TableMode, TableView, pagination_items};
