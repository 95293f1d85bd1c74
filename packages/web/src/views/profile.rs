use dioxus::prelude::*;
use store::validation::validate_profile;
use store::ProfileUpdate;
use ui::{server_message, use_auth, use_toast, AvatarUpload, LocationAutocomplete};

use super::{use_require_login, AppHeader};

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[component]
pub fn Profile() -> Element {
    use_require_login();
    let mut auth = use_auth();
    let mut toast = use_toast();

    let mut username = use_signal(String::new);
    let mut avatar_url = use_signal(String::new);
    let mut bio = use_signal(String::new);
    let mut location = use_signal(String::new);
    let mut loaded = use_signal(|| false);
    let mut saving = use_signal(|| false);
    let mut uploading = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    let _loader = use_resource(move || async move {
        if auth().user.is_none() {
            return;
        }
        match api::get_profile().await {
            Ok(Some(profile)) => {
                username.set(profile.username.unwrap_or_default());
                avatar_url.set(profile.avatar_url.unwrap_or_default());
                bio.set(profile.bio.unwrap_or_default());
                location.set(profile.location.unwrap_or_default());
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to load profile: {}", e);
                toast.error("获取资料失败", "请刷新页面重试");
            }
        }
        loaded.set(true);
    });

    let handle_save = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            error.set(None);
            let update = ProfileUpdate {
                username: username().trim().to_string(),
                avatar_url: optional(avatar_url()),
                bio: optional(bio()),
                location: optional(location()),
            };
            if let Err(e) = validate_profile(&update) {
                toast.error("验证失败", e.to_string());
                error.set(Some(e.to_string()));
                return;
            }

            saving.set(true);
            match api::update_profile(update.username, update.avatar_url, update.bio, update.location)
                .await
            {
                Ok(profile) => {
                    let mut state = auth();
                    if let Some(user) = state.user.as_mut() {
                        user.username = profile.username;
                        user.avatar_url = profile.avatar_url;
                    }
                    auth.set(state);
                    toast.success("更新成功", "你的个人资料已更新");
                }
                Err(e) => {
                    tracing::error!("Failed to update profile: {}", e);
                    toast.error("更新失败", server_message(&e));
                }
            }
            saving.set(false);
        });
    };

    if auth().loading {
        return rsx! {
            div { class: "page-status", "认证中..." }
        };
    }
    if !loaded() {
        return rsx! {
            div { class: "page-status", "加载中..." }
        };
    }

    let email = auth().user.map(|u| u.email).unwrap_or_default();

    rsx! {
        main {
            class: "page",
            AppHeader { back: true }
            section {
                class: "card profile-card",
                h1 { class: "page-title", "个人资料" }

                AvatarUpload {
                    url: Some(avatar_url()),
                    on_upload: move |url: String| avatar_url.set(url),
                    on_uploading: move |busy: bool| uploading.set(busy),
                }

                form {
                    class: "auth-form",
                    onsubmit: handle_save,

                    if let Some(err) = error() {
                        div { class: "form-error", "{err}" }
                    }

                    label { class: "field-label", "邮箱" }
                    input { class: "input", value: "{email}", disabled: true }

                    label { class: "field-label", "用户名" }
                    input {
                        class: "input",
                        placeholder: "设置你的用户名",
                        value: username(),
                        oninput: move |evt: FormEvent| username.set(evt.value()),
                    }

                    label { class: "field-label", "个人简介" }
                    textarea {
                        class: "input",
                        rows: 3,
                        placeholder: "介绍一下自己",
                        value: bio(),
                        oninput: move |evt: FormEvent| bio.set(evt.value()),
                    }

                    label { class: "field-label", "所在地" }
                    LocationAutocomplete {
                        value: location(),
                        on_change: move |value: String| location.set(value),
                    }

                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: saving() || uploading(),
                        if saving() { "更新中..." } else { "更新资料" }
                    }
                }
            }
        }
    }
}
