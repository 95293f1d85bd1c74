use dioxus::prelude::*;
use store::text::excerpt;
use store::DiaryEntry;

use crate::AnalysisView;

const EXCERPT_CHARS: usize = 120;

/// One entry in the diary list: date, title, a short excerpt and the analysis.
#[component]
pub fn DiaryCard(
    entry: DiaryEntry,
    #[props(default)] analyzing: bool,
    on_open: EventHandler<String>,
    on_edit: EventHandler<String>,
    on_delete: EventHandler<String>,
) -> Element {
    let date = entry.created_at.format("%Y/%m/%d").to_string();
    let preview = excerpt(&entry.content, EXCERPT_CHARS);
    let open_id = entry.id.clone();
    let edit_id = entry.id.clone();
    let delete_id = entry.id.clone();

    rsx! {
        article {
            class: "card diary-card",
            div {
                class: "diary-card-header",
                div {
                    class: "diary-card-meta",
                    onclick: move |_| on_open.call(open_id.clone()),
                    div { class: "muted small", "{date}" }
                    h3 { class: "diary-card-title", "{entry.title}" }
                    if let Some(category) = &entry.category {
                        span { class: "chip", "{category}" }
                    }
                    for tag in entry.tags.iter() {
                        span { key: "{tag}", class: "chip chip-tag", "#{tag}" }
                    }
                }
                div {
                    class: "diary-card-actions",
                    button {
                        class: "btn-icon",
                        title: "编辑",
                        onclick: move |_| on_edit.call(edit_id.clone()),
                        "✎"
                    }
                    button {
                        class: "btn-icon",
                        title: "删除",
                        onclick: move |_| on_delete.call(delete_id.clone()),
                        "🗑"
                    }
                }
            }
            if !preview.is_empty() {
                p { class: "diary-card-excerpt", "{preview}" }
            }
            hr { class: "separator" }
            AnalysisView {
                analysis: entry.analysis.clone(),
                analyzing,
            }
        }
    }
}
