// Dioxus desktop shell around the table controllers
pub mod app;
pub mod components;
pub mod sample_data;
pub mod views;

pub use app::{App, AppServices};
