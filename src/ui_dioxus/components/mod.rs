pub mod data_table;
pub mod pagination;

pub use data_table::DataTable;
pub use pagination::Pagination;
