use dioxus::prelude::*;
use store::DiaryDraft;
use ui::{server_message, use_toast, DiaryEditor};

use super::{use_require_login, AppHeader};
use crate::Route;

#[component]
pub fn DiaryEdit(id: String) -> Element {
    use_require_login();
    let nav = use_navigator();
    let mut toast = use_toast();
    let mut saving = use_signal(|| false);

    let id_for_load = id.clone();
    let entry = use_resource(move || {
        let id = id_for_load.clone();
        async move { api::get_diary(id).await }
    });

    let handle_submit = move |draft: DiaryDraft| {
        let id = id.clone();
        spawn(async move {
            saving.set(true);
            match api::update_diary(id.clone(), draft.title, draft.content, draft.category, draft.tags)
                .await
            {
                Ok(_) => {
                    toast.success("更新成功", "日记已更新");
                    nav.replace(Route::DiaryDetail { id });
                }
                Err(e) => {
                    tracing::error!("Failed to update diary {}: {}", id, e);
                    toast.error("保存失败", server_message(&e));
                }
            }
            saving.set(false);
        });
    };

    let body = match &*entry.read() {
        None => rsx! {
            div { class: "page-status", "加载中..." }
        },
        Some(Err(e)) => {
            tracing::warn!("Failed to load diary for editing: {}", e);
            rsx! {
                div { class: "page-status", "无法加载日记内容" }
            }
        }
        Some(Ok(diary)) => {
            let initial = DiaryDraft {
                title: diary.title.clone(),
                content: diary.content.clone(),
                category: diary.category.clone(),
                tags: diary.tags.clone(),
            };
            rsx! {
                DiaryEditor {
                    key: "{diary.id}",
                    initial,
                    saving: saving(),
                    submit_label: "更新",
                    on_submit: handle_submit,
                    on_cancel: move |_| {
                        nav.go_back();
                    },
                }
            }
        }
    };

    rsx! {
        main {
            class: "page",
            AppHeader { back: true }
            section {
                class: "card",
                h2 { class: "page-title", "编辑日记" }
                {body}
            }
        }
    }
}
