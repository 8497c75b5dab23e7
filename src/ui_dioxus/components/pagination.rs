use dioxus::prelude::*;

use crate::services::table_model::{PageItem, pagination_items};

/// Previous/next buttons around numbered pages with ellipses. `page` is
/// zero-based.
#[component]
pub fn Pagination(page: usize, page_count: usize, on_page_change: EventHandler<usize>) -> Element {
    let can_prev = page > 0;
    let can_next = page + 1 < page_count;
    let items = pagination_items(page, page_count);

    rsx! {
        div {
            class: "pagination-root",
            role: "navigation",
            aria_label: "pagination",

            button {
                class: "side",
                disabled: !can_prev,
                onclick: move |_| {
                    if can_prev {
                        on_page_change.call(page - 1);
                    }
                },
                span { class: "arrow", "←" }
                " Previous"
            }

            div {
                class: "pages",
                for (idx, item) in items.into_iter().enumerate() {
                    {match item {
                        PageItem::Page(number) => rsx! {
                            button {
                                key: "{number}-{idx}",
                                class: if number - 1 == page { "page current" } else { "page" },
                                onclick: move |_| on_page_change.call(number - 1),
                                "{number}"
                            }
                        },
                        PageItem::StartEllipsis | PageItem::EndEllipsis => rsx! {
                            span { key: "ellipsis-{idx}", class: "ellipsis", "…" }
                        },
                    }}
                }
            }

            button {
                class: "side",
                disabled: !can_next,
                onclick: move |_| {
                    if can_next {
                        on_page_change.call(page + 1);
                    }
                },
                "Next "
                span { class: "arrow", "→" }
            }
        }
    }
}
