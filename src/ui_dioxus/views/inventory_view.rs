use dioxus::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::domain::inventory::{InventoryFilters, inventory_columns};
use crate::domain::query::DEFAULT_PAGE_SIZE;
use crate::services::error_handling::UserErrorFormatter;
use crate::services::http_client::fetch_id_names;
use crate::services::{
    Backend, DataTableState, FilterOptions, FilterState, ServerTable, ServerTableOptions,
    TableAction,
};
use crate::ui_dioxus::app::AppServices;
use crate::ui_dioxus::components::{DataTable, Pagination};
use crate::ui_dioxus::sample_data::sample_statuses;

type InventoryTable = ServerTable<Value, InventoryFilters>;

#[component]
pub fn InventoryView() -> Element {
    let services = use_context::<Arc<AppServices>>();

    let table: Arc<InventoryTable> = use_hook(|| {
        Arc::new(ServerTable::new(
            services.inventory.clone(),
            ServerTableOptions::new("inventory-list", InventoryFilters::default()),
        ))
    });
    let columns = use_hook(inventory_columns);

    let mut snapshot = use_signal({
        let table = table.clone();
        move || table.snapshot()
    });
    let mut widget = use_signal({
        let table = table.clone();
        move || {
            let sink = table.clone();
            let mut widget = DataTableState::manual(DEFAULT_PAGE_SIZE)
                .with_on_change(move |change| sink.apply_table_change(change));
            widget.remount(&table.table_key());
            widget
        }
    });
    let mut search_text = use_signal(String::new);
    let mut selected_statuses = use_signal(Vec::<String>::new);
    let status_filter = use_hook({
        let table = table.clone();
        move || FilterState::new(Vec::<String>::new(), table.page_resetter())
    });

    // Status options: bundled in sample mode, from the backend otherwise
    let status_options = use_resource({
        let client = services.client.clone();
        move || {
            let client = client.clone();
            async move {
                let (entries, notice) = match client {
                    Some(client) => {
                        match fetch_id_names(&client, Backend::Core, "/table/filters/statuses/").await {
                            Ok(entries) => (entries, None),
                            Err(error) => {
                                warn!(error = %error, "Status options unavailable");
                                (Vec::new(), Some(UserErrorFormatter::format_for_ui(&error)))
                            }
                        }
                    }
                    None => (sample_statuses(), None),
                };
                (FilterOptions::from_id_names(&entries), notice)
            }
        }
    });

    // Fetch whenever the request parameters change
    use_future({
        let table = table.clone();
        move || {
            let table = table.clone();
            async move { table.run().await }
        }
    });

    // Mirror snapshots into the UI and remount the widget on a new table key
    use_future({
        let table = table.clone();
        move || {
            let table = table.clone();
            async move {
                let mut updates = table.subscribe();
                while updates.changed().await.is_ok() {
                    let next = updates.borrow_and_update().clone();
                    widget.write().remount(&next.table_key);
                    snapshot.set(next);
                }
            }
        }
    });

    let current = snapshot();
    let view = widget
        .read()
        .view(&current.rows, &columns, Some(current.page_count));
    let (options, status_notice) = status_options.read().as_ref().cloned().unwrap_or_default();
    let selected = selected_statuses();
    let chips: Vec<(String, bool)> = options
        .options
        .iter()
        .map(|option| (option.clone(), selected.contains(option)))
        .collect();

    let on_search = {
        let table = table.clone();
        move |e: FormEvent| {
            let text = e.value();
            search_text.set(text.clone());
            table.set_search(text);
        }
    };

    let on_toggle_status = {
        let table = table.clone();
        let options = options.clone();
        let status_filter = status_filter.clone();
        move |value: String| {
            status_filter.update(|current| {
                let mut next = current.clone();
                match next.iter().position(|selected| *selected == value) {
                    Some(index) => {
                        next.remove(index);
                    }
                    None => next.push(value.clone()),
                }
                next
            });
            let next = status_filter.get();
            let status_ids = options.ids_for(&next);
            selected_statuses.set(next);
            table.set_filters(InventoryFilters {
                status_ids,
                ..table.filters()
            });
        }
    };

    rsx! {
        div {
            class: "inventory-view card",
            style: "padding: 16px;",

            div {
                class: "toolbar-row",
                h1 { style: "font-size: 1.4rem; font-weight: bold;", "Inventory" }
                div { class: "spacer" }
                input {
                    class: "input",
                    placeholder: "Search part numbers…",
                    style: "width: 260px;",
                    value: "{search_text}",
                    oninput: on_search,
                }
                span { class: "small", "{current.total_records} items" }
                if current.is_fetching {
                    span { class: "small", "Refreshing…" }
                }
            }

            div {
                class: "filter-chips",
                {status_notice.map(|notice| rsx! {
                    span { class: "small error", "Status filters unavailable: {notice}" }
                })}
                for (label, active) in chips.into_iter() {
                    StatusChip {
                        label,
                        active,
                        on_toggle: on_toggle_status.clone(),
                    }
                }
            }

            if current.is_loading {
                div { class: "small", style: "padding: 16px;", "Loading…" }
            } else {
                DataTable {
                    view: view.clone(),
                    show_search: false,
                    show_footer: false,
                    on_action: move |action: TableAction| {
                        widget.write().apply(action);
                    },
                }
                Pagination {
                    page: view.page_index,
                    page_count: view.page_count,
                    on_page_change: move |page: usize| {
                        widget.write().apply(TableAction::SetPageIndex(page));
                    },
                }
            }
        }
    }
}

#[component]
fn StatusChip(label: String, active: bool, on_toggle: EventHandler<String>) -> Element {
    let value = label.clone();
    rsx! {
        button {
            class: if active { "chip active" } else { "chip" },
            onclick: move |_| on_toggle.call(value.clone()),
            "{label}"
        }
    }
}
