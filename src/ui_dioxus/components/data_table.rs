use dioxus::prelude::*;

use crate::domain::column::Align;
use crate::services::table_model::{HeaderView, SortDirection, TableAction, TableView};

const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 50];

fn sort_icon(direction: Option<SortDirection>) -> &'static str {
    match direction {
        Some(SortDirection::Asc) => "▲",
        Some(SortDirection::Desc) => "▼",
        None => "⇅",
    }
}

fn cell_class(align: Align) -> &'static str {
    match align {
        Align::Right => "cell-right",
        Align::Left => "",
    }
}

/// Renders a precomputed `TableView`. All interaction goes out through
/// `on_action`; the component keeps no state of its own.
#[component]
pub fn DataTable(
    view: TableView,
    on_action: EventHandler<TableAction>,
    #[props(default = true)] show_search: bool,
    #[props(default = true)] show_footer: bool,
) -> Element {
    let page_size = view.page_size;
    let page_index = view.page_index;
    let column_count = view.headers.len();
    let page_label = view.page_label();

    rsx! {
        div {
            if show_search {
                div {
                    class: "toolbar-row",
                    input {
                        class: "input",
                        placeholder: "Search…",
                        style: "width: 260px;",
                        value: "{view.global_filter}",
                        oninput: move |e| on_action.call(TableAction::SetGlobalFilter(e.value())),
                    }
                    div { class: "spacer" }
                    span { class: "small", "Rows: {view.row_count}" }
                    select {
                        class: "select",
                        value: "{page_size}",
                        onchange: move |e| {
                            if let Ok(size) = e.value().parse::<usize>() {
                                on_action.call(TableAction::SetPageSize(size));
                            }
                        },
                        for size in PAGE_SIZE_OPTIONS {
                            option { key: "{size}", value: "{size}", "{size} / page" }
                        }
                    }
                }
            }

            div {
                class: "table-wrap",
                table {
                    class: "table",
                    thead {
                        tr {
                            for header in view.headers.iter().cloned() {
                                HeaderCell { header, on_action }
                            }
                        }
                    }
                    tbody {
                        if view.rows.is_empty() {
                            tr {
                                td {
                                    colspan: "{column_count}",
                                    class: "small",
                                    style: "padding: 16px;",
                                    "No data"
                                }
                            }
                        }
                        for (index, row) in view.rows.iter().enumerate() {
                            tr {
                                key: "{index}",
                                class: "tr",
                                for (cell, header) in row.iter().zip(view.headers.iter()) {
                                    td { class: cell_class(header.align), "{cell}" }
                                }
                            }
                        }
                    }
                }
            }

            if show_footer {
                div {
                    class: "pagination",
                    button {
                        class: "page-btn",
                        disabled: !view.can_previous,
                        onclick: move |_| on_action.call(TableAction::SetPageIndex(page_index.saturating_sub(1))),
                        "‹"
                    }
                    for page in view.page_buttons.iter().copied() {
                        button {
                            key: "{page}",
                            class: if page == page_index { "page-btn active" } else { "page-btn" },
                            onclick: move |_| on_action.call(TableAction::SetPageIndex(page)),
                            "{page + 1}"
                        }
                    }
                    button {
                        class: "page-btn",
                        disabled: !view.can_next,
                        onclick: move |_| on_action.call(TableAction::SetPageIndex(page_index.saturating_add(1))),
                        "›"
                    }
                    div { class: "spacer" }
                    span { class: "small", "{page_label}" }
                }
            }
        }
    }
}

#[component]
fn HeaderCell(header: HeaderView, on_action: EventHandler<TableAction>) -> Element {
    let icon = sort_icon(header.sort);
    let class = cell_class(header.align);
    let label = header.label.clone();
    let column_id = header.id.clone();
    let sortable = header.sortable;

    rsx! {
        th {
            class,
            span {
                class: "th-sort",
                onclick: move |e: MouseEvent| {
                    if sortable {
                        on_action.call(TableAction::ToggleSorting {
                            column_id: column_id.clone(),
                            multi: e.modifiers().shift(),
                        });
                    }
                },
                "{label} "
                span { class: "sort-icon", "{icon}" }
            }
        }
    }
}
