pub mod column;
pub mod inventory;
pub mod pagination;
pub mod query;

pub use column::{Align, CellRenderer, ColumnDescriptor, ColumnKind};
pub use pagination::{IdName, NoFilters, PaginationInfo, ServerTableParams, ServerTableResponse};
pub use query::{ColumnFilter, SortingRule, TableChange, TableQueryState};
