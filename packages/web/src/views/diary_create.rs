use dioxus::prelude::*;
use store::{Category, DiaryDraft};
use ui::{server_message, use_toast, DiaryEditor};

use super::{use_require_login, AppHeader};
use crate::Route;

#[component]
pub fn DiaryCreate() -> Element {
    use_require_login();
    let nav = use_navigator();
    let mut toast = use_toast();
    let mut saving = use_signal(|| false);

    let initial = DiaryDraft::default().with_category(Category::default().as_str());

    let handle_submit = move |draft: DiaryDraft| {
        spawn(async move {
            saving.set(true);
            match api::create_diary(draft.title, draft.content, draft.category, draft.tags).await {
                Ok(entry) => {
                    tracing::info!("Created diary {}", entry.id);
                    toast.success("保存成功", "日记已保存");
                    nav.replace(Route::Home {});
                }
                Err(e) => {
                    tracing::error!("Failed to create diary: {}", e);
                    toast.error("保存失败", server_message(&e));
                }
            }
            saving.set(false);
        });
    };

    rsx! {
        main {
            class: "page",
            AppHeader { back: true }
            section {
                class: "card",
                h2 { class: "page-title", "新建日记" }
                DiaryEditor {
                    initial,
                    saving: saving(),
                    on_submit: handle_submit,
                    on_cancel: move |_| {
                        nav.go_back();
                    },
                }
            }
        }
    }
}
