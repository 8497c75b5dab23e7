use dioxus::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::config::ApiConfig;
use crate::domain::inventory::{INVENTORY_ENDPOINT, InventoryFilters};
use crate::services::{
    ApiClient, Backend, HttpTableSource, InMemorySource, SessionHandle, SharedSource,
};
use crate::ui_dioxus::sample_data::sample_inventory;
use crate::ui_dioxus::views::InventoryView;

/// Everything the views need, provided once as context.
#[derive(Clone)]
pub struct AppServices {
    pub config: ApiConfig,
    pub session: SessionHandle,
    /// `None` in mock mode.
    pub client: Option<ApiClient>,
    pub inventory: SharedSource<Value, InventoryFilters>,
}

impl AppServices {
    pub fn from_config(config: ApiConfig) -> Self {
        let session = SessionHandle::new();
        let client = if config.use_mocks {
            None
        } else {
            match ApiClient::new(config.clone(), session.clone()) {
                Ok(client) => Some(client),
                Err(error) => {
                    warn!(error = %error, "HTTP client unavailable, falling back to sample data");
                    None
                }
            }
        };

        let inventory: SharedSource<Value, InventoryFilters> = match &client {
            Some(client) => Arc::new(HttpTableSource::new(
                client.clone(),
                Backend::Core,
                INVENTORY_ENDPOINT,
            )),
            None => Arc::new(InMemorySource::new(
                "inventory-sample",
                sample_inventory(),
                |row: &Value, filters: &InventoryFilters| filters.matches(row),
            )),
        };

        Self {
            config,
            session,
            client,
            inventory,
        }
    }
}

#[component]
pub fn App() -> Element {
    let services = use_hook(|| {
        let config = ApiConfig::from_env().unwrap_or_else(|error| {
            warn!(error = %error, "Invalid environment, using defaults");
            ApiConfig::default()
        });
        Arc::new(AppServices::from_config(config))
    });
    use_context_provider(|| services.clone());

    let mode = if services.client.is_some() { "live" } else { "sample data" };

    rsx! {
        div {
            class: "app-container",

            nav {
                class: "navbar",
                div { class: "nav-brand", "MSM" }
                div { class: "nav-menu",
                    button { class: "nav-item active", "📦 Inventory" }
                }
                span { class: "small", "{mode}" }
            }

            main {
                class: "main-content",
                InventoryView {}
            }
        }
    }
}
