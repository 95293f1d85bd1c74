use dioxus::prelude::*;
use ui::{server_message, use_toast};

use super::AuthCard;
use crate::Route;

/// Landing page of the link sent by the forgot-password form.
#[component]
pub fn ResetPassword(token: String) -> Element {
    let nav = use_navigator();
    let mut toast = use_toast();
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let token = token.clone();
        spawn(async move {
            error.set(None);
            if let Err(err) = api::auth::validate_new_password(&password(), &confirm_password()) {
                error.set(Some(err.to_string()));
                return;
            }

            loading.set(true);
            match api::reset_password(token, password()).await {
                Ok(()) => {
                    toast.success("密码已重置", "请使用新密码登录");
                    nav.replace(Route::Login {});
                }
                Err(err) => error.set(Some(server_message(&err))),
            }
            loading.set(false);
        });
    };

    rsx! {
        AuthCard {
            title: "设置新密码",
            form {
                class: "auth-form",
                onsubmit: handle_submit,

                if let Some(err) = error() {
                    div { class: "form-error", "{err}" }
                }

                label { class: "field-label", "新密码" }
                input {
                    class: "input",
                    r#type: "password",
                    placeholder: "至少6个字符",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }
                label { class: "field-label", "确认密码" }
                input {
                    class: "input",
                    r#type: "password",
                    placeholder: "再次输入密码",
                    value: confirm_password(),
                    oninput: move |evt: FormEvent| confirm_password.set(evt.value()),
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "提交中..." } else { "重置密码" }
                }
            }
        }
    }
}
