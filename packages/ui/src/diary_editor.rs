//! The diary form: title, category, tags and a markdown body with a
//! formatting toolbar and a preview tab.

use dioxus::prelude::*;
use store::text::normalize_tag;
use store::{Category, DiaryDraft};

use crate::format::{self, byte_to_utf16, utf16_to_byte, FormatAction, Selection};
use crate::MarkdownView;

const CONTENT_ID: &str = "diary-content";
const TAG_SEPARATORS: [char; 2] = [',', '，'];

/// Add the tags typed into the tag input to `existing`.
///
/// The input may hold several tags separated by ASCII or full-width commas.
/// A leading `#` is dropped, blanks are ignored and tags already present are
/// not added twice.
pub fn merge_tags(existing: &[String], input: &str) -> Vec<String> {
    let mut tags = existing.to_vec();
    for tag in input.split(TAG_SEPARATORS).filter_map(normalize_tag) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Write,
    Preview,
}

async fn read_selection() -> Option<(usize, usize)> {
    let mut eval = document::eval(&format!(
        r#"
        const el = document.getElementById("{CONTENT_ID}");
        dioxus.send(el ? [el.selectionStart, el.selectionEnd] : null);
        "#
    ));
    match eval.recv::<Option<(usize, usize)>>().await {
        Ok(selection) => selection,
        Err(e) => {
            tracing::warn!("Failed to read editor selection: {:?}", e);
            None
        }
    }
}

fn restore_selection(start: usize, end: usize) {
    let _ = document::eval(&format!(
        r#"
        requestAnimationFrame(() => {{
            const el = document.getElementById("{CONTENT_ID}");
            if (el) {{
                el.focus();
                el.setSelectionRange({start}, {end});
            }}
        }});
        "#
    ));
}

/// The radio to check for a stored category. Unknown values check none.
fn selected_category(stored: Option<&str>) -> Option<Category> {
    stored.and_then(Category::parse)
}

#[component]
pub fn DiaryEditor(
    #[props(default)] initial: DiaryDraft,
    #[props(default = "保存".to_string())] submit_label: String,
    #[props(default)] saving: bool,
    on_submit: EventHandler<DiaryDraft>,
    on_cancel: EventHandler<()>,
) -> Element {
    let mut title = use_signal(|| initial.title.clone());
    let mut content = use_signal(|| initial.content.clone());
    let mut category = use_signal(|| initial.category.clone());
    let mut tags = use_signal(|| initial.tags.clone());
    let mut tag_input = use_signal(String::new);
    let mut tab = use_signal(|| Tab::Write);

    let mut commit_tags = move |input: &str| {
        let merged = merge_tags(&tags.peek(), input);
        tags.set(merged);
        tag_input.set(String::new());
    };

    let run_action = move |action: FormatAction| {
        spawn(async move {
            let text = content();
            let selection = match read_selection().await {
                Some((start, end)) => {
                    Selection::new(utf16_to_byte(&text, start), utf16_to_byte(&text, end))
                }
                None => Selection::cursor(text.len()),
            };
            let edit = format::apply(&text, selection, action);
            let start = byte_to_utf16(&edit.text, edit.selection.start);
            let end = byte_to_utf16(&edit.text, edit.selection.end);
            content.set(edit.text);
            restore_selection(start, end);
        });
    };

    let submit = move |evt: FormEvent| {
        evt.prevent_default();
        // Tags still sitting in the input count too.
        let pending = tag_input.peek().clone();
        if !pending.trim().is_empty() {
            commit_tags(&pending);
        }
        on_submit.call(DiaryDraft {
            title: title(),
            content: content(),
            category: category(),
            tags: tags(),
        });
    };

    rsx! {
        form {
            class: "diary-editor",
            onsubmit: submit,

            input {
                class: "input diary-title",
                placeholder: "标题",
                value: "{title}",
                oninput: move |evt| title.set(evt.value()),
            }

            div {
                class: "diary-categories",
                for c in Category::ALL {
                    label {
                        key: "{c}",
                        class: "radio",
                        input {
                            r#type: "radio",
                            name: "category",
                            checked: selected_category(category().as_deref()) == Some(c),
                            onchange: move |_| category.set(Some(c.as_str().to_string())),
                        }
                        "{c}"
                    }
                }
            }

            div {
                class: "diary-tags",
                for tag in tags() {
                    span {
                        key: "{tag}",
                        class: "chip chip-tag",
                        "#{tag}"
                        button {
                            r#type: "button",
                            class: "chip-remove",
                            onclick: {
                                let tag = tag.clone();
                                move |_| tags.write().retain(|t| *t != tag)
                            },
                            "×"
                        }
                    }
                }
                input {
                    class: "input tag-input",
                    placeholder: "添加标签，回车或逗号分隔",
                    value: "{tag_input}",
                    oninput: move |evt: FormEvent| {
                        let value = evt.value();
                        if value.contains(TAG_SEPARATORS) {
                            commit_tags(&value);
                        } else {
                            tag_input.set(value);
                        }
                    },
                    onkeydown: move |evt: KeyboardEvent| {
                        if evt.key() == Key::Enter {
                            evt.prevent_default();
                            let value = tag_input.peek().clone();
                            commit_tags(&value);
                        }
                    },
                }
            }

            div {
                class: "editor-tabs",
                button {
                    r#type: "button",
                    class: if tab() == Tab::Write { "tab tab-active" } else { "tab" },
                    onclick: move |_| tab.set(Tab::Write),
                    "编辑"
                }
                button {
                    r#type: "button",
                    class: if tab() == Tab::Preview { "tab tab-active" } else { "tab" },
                    onclick: move |_| tab.set(Tab::Preview),
                    "预览"
                }
            }

            if tab() == Tab::Write {
                div {
                    class: "editor-toolbar",
                    for action in FormatAction::TOOLBAR {
                        button {
                            key: "{action.title()}",
                            r#type: "button",
                            class: "toolbar-button",
                            title: action.title(),
                            onclick: move |_| run_action(action),
                            "{action.glyph()}"
                        }
                    }
                }
                textarea {
                    id: CONTENT_ID,
                    class: "editor-textarea",
                    placeholder: "写点什么吧…",
                    value: "{content}",
                    oninput: move |evt| content.set(evt.value()),
                }
            } else {
                MarkdownView { content: content(), class: "editor-preview" }
            }

            div {
                class: "editor-actions",
                button {
                    r#type: "button",
                    class: "btn btn-outline",
                    onclick: move |_| on_cancel.call(()),
                    "取消"
                }
                button {
                    r#type: "submit",
                    class: "btn btn-primary",
                    disabled: saving,
                    if saving { "保存中..." } else { "{submit_label}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_merge_tags_splits_on_both_commas() {
        let merged = merge_tags(&[], "跑步, #阅读，写作");
        assert_eq!(merged, tags(&["跑步", "阅读", "写作"]));
    }

    #[test]
    fn test_selected_category_tolerates_padding() {
        assert_eq!(selected_category(Some(" 知识 ")), Some(Category::Knowledge));
        assert_eq!(selected_category(Some("旅行")), None);
        assert_eq!(selected_category(None), None);
    }

    #[test]
    fn test_merge_tags_skips_duplicates_and_blanks() {
        let merged = merge_tags(&tags(&["跑步"]), "#跑步,, ,冥想");
        assert_eq!(merged, tags(&["跑步", "冥想"]));
    }
}
