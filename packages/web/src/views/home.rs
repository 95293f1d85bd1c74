//! Diary list: newest first, with the analysis status of each entry.

use dioxus::prelude::*;
use store::DiaryEntry;
use ui::{use_auth, use_toast, ConfirmDialog, DiaryCard};

use super::{use_require_login, AppHeader};
use crate::Route;

/// How often running analyses are checked while any are in flight.
const POLL_MS: u32 = 3000;

#[component]
pub fn Home() -> Element {
    use_require_login();
    let auth = use_auth();
    let nav = use_navigator();
    let mut toast = use_toast();

    let mut diaries = use_signal(Vec::<DiaryEntry>::new);
    let mut analyzing = use_signal(Vec::<String>::new);
    let mut loading = use_signal(|| true);
    let mut reload = use_signal(|| 0u32);
    let mut active_tag = use_signal(|| Option::<String>::None);
    let mut deleting = use_signal(|| Option::<String>::None);

    let _loader = use_resource(move || async move {
        reload();
        if auth().user.is_none() {
            return;
        }
        match api::list_diaries().await {
            Ok(list) => diaries.set(list),
            Err(e) => {
                tracing::error!("Failed to load diaries: {}", e);
                toast.error("加载失败", "获取日记列表失败");
            }
        }
        loading.set(false);
        match api::analyzing_diaries().await {
            Ok(status) => {
                if !status.failed.is_empty() {
                    toast.error("AI 分析失败", "部分日记的分析未能完成，可在详情页重新分析");
                }
                analyzing.set(status.analyzing);
            }
            Err(e) => tracing::warn!("Failed to load analysis status: {}", e),
        }
    });

    let tags = use_resource(move || async move {
        reload();
        if auth().user.is_none() {
            return Vec::new();
        }
        api::list_tags().await.unwrap_or_default()
    });

    // Refresh the list when an analysis in flight finishes, and say so when it failed.
    use_future(move || async move {
        loop {
            ui::sleep_ms(POLL_MS).await;
            if analyzing.peek().is_empty() {
                continue;
            }
            match api::analyzing_diaries().await {
                Ok(status) => {
                    let ids = status.analyzing;
                    let finished = analyzing.peek().iter().any(|id| !ids.contains(id));
                    analyzing.set(ids);
                    if !status.failed.is_empty() {
                        toast.error("AI 分析失败", "部分日记的分析未能完成，可在详情页重新分析");
                    }
                    if finished {
                        *reload.write() += 1;
                    }
                }
                Err(e) => tracing::warn!("Failed to poll analysis status: {}", e),
            }
        }
    });

    let confirm_delete = move |_| {
        let Some(id) = deleting() else {
            return;
        };
        spawn(async move {
            match api::delete_diary(id.clone()).await {
                Ok(()) => {
                    diaries.write().retain(|d| d.id != id);
                    toast.success("删除成功", "日记已删除");
                }
                Err(e) => {
                    tracing::error!("Failed to delete diary {}: {}", id, e);
                    toast.error("删除失败", "请稍后重试");
                }
            }
            deleting.set(None);
        });
    };

    if auth().loading || (auth().user.is_some() && loading()) {
        return rsx! {
            div { class: "page-status", "加载中..." }
        };
    }
    if auth().user.is_none() {
        return rsx! {};
    }

    let visible: Vec<DiaryEntry> = match active_tag() {
        Some(tag) => diaries()
            .into_iter()
            .filter(|d| d.tags.contains(&tag))
            .collect(),
        None => diaries(),
    };
    let all_tags = tags().unwrap_or_default();

    rsx! {
        main {
            class: "page",
            AppHeader {}

            if !all_tags.is_empty() {
                div {
                    class: "tag-filter",
                    button {
                        class: if active_tag().is_none() { "chip chip-active" } else { "chip" },
                        onclick: move |_| active_tag.set(None),
                        "全部"
                    }
                    for tag in all_tags {
                        button {
                            key: "{tag}",
                            class: if active_tag().as_deref() == Some(tag.as_str()) { "chip chip-active" } else { "chip chip-tag" },
                            onclick: {
                                let tag = tag.clone();
                                move |_| active_tag.set(Some(tag.clone()))
                            },
                            "#{tag}"
                        }
                    }
                }
            }

            if visible.is_empty() {
                div { class: "empty-state muted", "还没有日记，开始写第一篇吧！" }
            } else {
                for entry in visible {
                    DiaryCard {
                        key: "{entry.id}",
                        analyzing: analyzing().contains(&entry.id),
                        entry: entry.clone(),
                        on_open: move |id| {
                            nav.push(Route::DiaryDetail { id });
                        },
                        on_edit: move |id| {
                            nav.push(Route::DiaryEdit { id });
                        },
                        on_delete: move |id| deleting.set(Some(id)),
                    }
                }
            }

            Link {
                class: "fab",
                to: Route::DiaryCreate {},
                "+"
            }

            if deleting().is_some() {
                ConfirmDialog {
                    on_confirm: confirm_delete,
                    on_cancel: move |_| deleting.set(None),
                }
            }
        }
    }
}
