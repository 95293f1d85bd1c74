//! One entry with its rendered body and analysis.

use dioxus::prelude::*;
use ui::{server_message, use_toast, AnalysisView, ConfirmDialog, MarkdownView};

use super::{use_require_login, AppHeader};
use crate::Route;

const POLL_MS: u32 = 3000;

#[component]
pub fn DiaryDetail(id: String) -> Element {
    use_require_login();
    let nav = use_navigator();
    let mut toast = use_toast();
    let mut analyzing = use_signal(|| false);
    let mut confirm_delete = use_signal(|| false);

    let id_for_load = id.clone();
    let mut entry = use_resource(move || {
        let id = id_for_load.clone();
        async move { api::get_diary(id).await }
    });

    let id_for_poll = id.clone();
    use_future(move || {
        let id = id_for_poll.clone();
        async move {
            loop {
                match api::analyzing_diaries().await {
                    Ok(status) => {
                        let running = status.analyzing.contains(&id);
                        let was_running = *analyzing.peek();
                        analyzing.set(running);
                        if status.failed.contains(&id) {
                            toast.error("AI 分析失败", "分析未能完成，请稍后重新分析");
                        }
                        if was_running && !running {
                            entry.restart();
                        }
                    }
                    Err(e) => tracing::warn!("Failed to poll analysis status: {}", e),
                }
                ui::sleep_ms(POLL_MS).await;
            }
        }
    });

    let id_for_reanalyze = id.clone();
    let reanalyze = move |_| {
        let id = id_for_reanalyze.clone();
        spawn(async move {
            match api::reanalyze_diary(id).await {
                Ok(()) => analyzing.set(true),
                Err(e) => toast.error("AI 分析失败", server_message(&e)),
            }
        });
    };

    let id_for_delete = id.clone();
    let handle_delete = move |_| {
        let id = id_for_delete.clone();
        spawn(async move {
            match api::delete_diary(id).await {
                Ok(()) => {
                    toast.success("删除成功", "日记已删除");
                    nav.replace(Route::Home {});
                }
                Err(e) => {
                    tracing::error!("Failed to delete diary: {}", e);
                    toast.error("删除失败", "请稍后重试");
                }
            }
            confirm_delete.set(false);
        });
    };

    let body = match &*entry.read() {
        None => rsx! {
            div { class: "page-status", "载入中..." }
        },
        Some(Err(_)) => rsx! {
            div { class: "page-status", "内容不存在或已被删除" }
        },
        Some(Ok(diary)) => {
            let date = diary.created_at.format("%Y/%m/%d %H:%M").to_string();
            let edit_id = diary.id.clone();
            rsx! {
                article {
                    class: "card",
                    div {
                        class: "diary-detail-header",
                        div {
                            div { class: "muted small", "{date}" }
                            h1 { class: "page-title", "{diary.title}" }
                            if let Some(category) = &diary.category {
                                span { class: "chip", "{category}" }
                            }
                            for tag in diary.tags.iter() {
                                span { key: "{tag}", class: "chip chip-tag", "#{tag}" }
                            }
                        }
                        div {
                            class: "diary-card-actions",
                            button {
                                class: "btn btn-outline btn-sm",
                                onclick: move |_| {
                                    nav.push(Route::DiaryEdit { id: edit_id.clone() });
                                },
                                "编辑"
                            }
                            button {
                                class: "btn btn-ghost btn-sm",
                                onclick: move |_| confirm_delete.set(true),
                                "删除"
                            }
                        }
                    }
                    hr { class: "separator" }
                    MarkdownView { content: diary.content.clone() }
                }
                section {
                    class: "card",
                    div {
                        class: "analysis-header",
                        span { class: "muted small", "AI分析" }
                        button {
                            class: "btn btn-ghost btn-sm",
                            disabled: analyzing(),
                            onclick: reanalyze,
                            "重新分析"
                        }
                    }
                    AnalysisView {
                        analysis: diary.analysis.clone(),
                        analyzing: analyzing(),
                        with_heading: true,
                    }
                }
            }
        }
    };

    rsx! {
        main {
            class: "page",
            AppHeader { back: true }
            {body}
            if confirm_delete() {
                ConfirmDialog {
                    on_confirm: handle_delete,
                    on_cancel: move |_| confirm_delete.set(false),
                }
            }
        }
    }
}
