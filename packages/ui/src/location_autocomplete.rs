//! Place search box for the profile location field.

use dioxus::prelude::*;
use store::LocationItem;

use crate::server_message;

const DEBOUNCE_MS: u32 = 300;

/// Append a configuration hint to provider errors that usually mean the
/// service keys are wrong.
pub fn friendly_location_error(message: &str) -> String {
    if message.contains("签名") {
        format!("{message}（请检查密钥配置）")
    } else if message.to_lowercase().contains("key") {
        format!("{message}（请确认密钥正确且已启用）")
    } else {
        message.to_string()
    }
}

#[component]
pub fn LocationAutocomplete(
    value: String,
    on_change: EventHandler<String>,
    #[props(default = "搜索地点".to_string())] placeholder: String,
) -> Element {
    let mut query = use_signal(|| value.clone());
    let mut results = use_signal(Vec::<LocationItem>::new);
    let mut loading = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let mut open = use_signal(|| false);
    let mut generation = use_signal(|| 0u64);

    let mut search = move |keyword: String| {
        let current = *generation.peek() + 1;
        generation.set(current);
        spawn(async move {
            crate::sleep_ms(DEBOUNCE_MS).await;
            // A newer keystroke superseded this search.
            if *generation.peek() != current {
                return;
            }
            loading.set(true);
            error.set(None);
            match api::search_locations(keyword).await {
                Ok(items) if *generation.peek() == current => results.set(items),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Location search failed: {}", e);
                    results.set(Vec::new());
                    error.set(Some(friendly_location_error(&server_message(&e))));
                }
            }
            loading.set(false);
        });
    };

    rsx! {
        div {
            class: "autocomplete",
            input {
                class: "input",
                placeholder: "{placeholder}",
                value: "{query}",
                onfocus: move |_| {
                    open.set(true);
                    search(query());
                },
                oninput: move |evt: FormEvent| {
                    let text = evt.value();
                    query.set(text.clone());
                    on_change.call(text.clone());
                    open.set(true);
                    search(text);
                },
            }
            if open() {
                div {
                    class: "autocomplete-list",
                    if loading() {
                        div { class: "autocomplete-status", "加载中..." }
                    } else if let Some(message) = error() {
                        div { class: "autocomplete-status error-text", "{message}" }
                    } else if results().is_empty() {
                        div { class: "autocomplete-status", "没有找到匹配的地点" }
                    } else {
                        for item in results() {
                            button {
                                key: "{item.id}",
                                class: "autocomplete-item",
                                onclick: {
                                    let title = item.title.clone();
                                    move |_| {
                                        query.set(title.clone());
                                        on_change.call(title.clone());
                                        open.set(false);
                                    }
                                },
                                div { class: "autocomplete-title", "{item.title}" }
                                div { class: "muted small", "{item.address}" }
                                if !item.region_label().is_empty() {
                                    div { class: "muted small", "{item.region_label()}" }
                                }
                            }
                        }
                    }
                    button {
                        class: "autocomplete-close",
                        onclick: move |_| open.set(false),
                        "关闭"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_errors_get_key_hint() {
        assert_eq!(
            friendly_location_error("签名验证失败"),
            "签名验证失败（请检查密钥配置）"
        );
    }

    #[test]
    fn test_key_errors_get_enable_hint() {
        assert_eq!(
            friendly_location_error("key格式错误"),
            "key格式错误（请确认密钥正确且已启用）"
        );
    }

    #[test]
    fn test_other_errors_pass_through() {
        assert_eq!(friendly_location_error("网络错误"), "网络错误");
    }
}
