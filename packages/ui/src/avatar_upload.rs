//! Avatar display and upload.
//!
//! The picked file is read in the browser and shipped to the server function as
//! raw bytes under a random file name that keeps the original extension.

use dioxus::prelude::*;
use serde::Deserialize;

use crate::{server_message, use_toast};

const INPUT_ID: &str = "avatar-input";

#[derive(Debug, Deserialize)]
struct PickedFile {
    name: String,
    bytes: Vec<u8>,
}

fn read_picked_file_js() -> String {
    format!(
        r#"
        const input = document.getElementById("{INPUT_ID}");
        const file = input && input.files && input.files[0];
        if (!file) {{
            dioxus.send(null);
            return;
        }}
        const buf = await file.arrayBuffer();
        const ext = file.name.includes(".") ? file.name.split(".").pop() : "png";
        const name = Math.random().toString(36).slice(2) + "." + ext;
        input.value = "";
        dioxus.send({{ name, bytes: Array.from(new Uint8Array(buf)) }});
        "#
    )
}

/// Round avatar: the image when there is one, otherwise the initial.
#[component]
pub fn Avatar(
    url: Option<String>,
    #[props(default = "?".to_string())] initial: String,
    #[props(default = 40)] size: u32,
) -> Element {
    let style = format!("width: {size}px; height: {size}px;");
    match url.filter(|u| !u.is_empty()) {
        Some(src) => rsx! {
            img { class: "avatar", style: "{style}", src: "{src}", alt: "头像" }
        },
        None => rsx! {
            span { class: "avatar avatar-fallback", style: "{style}", "{initial}" }
        },
    }
}

#[component]
pub fn AvatarUpload(
    url: Option<String>,
    on_upload: EventHandler<String>,
    #[props(default)] on_uploading: EventHandler<bool>,
    #[props(default = 150)] size: u32,
) -> Element {
    let mut uploading = use_signal(|| false);
    let mut toast = use_toast();
    let has_url = url.as_deref().is_some_and(|u| !u.is_empty());

    let handle_change = move |_| {
        spawn(async move {
            uploading.set(true);
            on_uploading.call(true);

            let mut eval = document::eval(&read_picked_file_js());
            let result = match eval.recv::<Option<PickedFile>>().await {
                Ok(Some(file)) => api::upload_avatar(file.name, file.bytes)
                    .await
                    .map_err(|e| server_message(&e)),
                Ok(None) => Err("请选择要上传的图片".to_string()),
                Err(e) => {
                    tracing::error!("Failed to read avatar file: {:?}", e);
                    Err("请稍后重试".to_string())
                }
            };

            match result {
                Ok(public_url) => on_upload.call(public_url),
                Err(message) => toast.error("上传失败", message),
            }

            uploading.set(false);
            on_uploading.call(false);
        });
    };

    let pick = move |evt: Event<MouseData>| {
        evt.prevent_default();
        evt.stop_propagation();
        let _ = document::eval(&format!(
            r#"document.getElementById("{INPUT_ID}")?.click();"#
        ));
    };

    rsx! {
        div {
            class: "avatar-upload",
            div {
                class: "avatar-upload-target",
                style: "width: {size}px; height: {size}px;",
                onclick: pick,
                if let Some(src) = url.clone().filter(|u| !u.is_empty()) {
                    img { class: "avatar-upload-image", src: "{src}", alt: "Avatar" }
                } else {
                    span { class: "muted small", "上传头像" }
                }
            }
            div {
                class: "avatar-upload-actions",
                button {
                    class: "btn btn-outline btn-sm",
                    disabled: uploading(),
                    onclick: pick,
                    if uploading() { "上传中..." } else { "更换头像" }
                }
                if has_url {
                    button {
                        class: "btn btn-ghost btn-sm",
                        disabled: uploading(),
                        onclick: move |evt: Event<MouseData>| {
                            evt.prevent_default();
                            on_upload.call(String::new());
                        },
                        "移除"
                    }
                }
            }
            input {
                id: INPUT_ID,
                r#type: "file",
                accept: "image/*",
                class: "hidden",
                onchange: handle_change,
            }
        }
    }
}
