pub mod inventory_view;

pub use inventory_view::InventoryView;
