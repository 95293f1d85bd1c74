use dioxus::prelude::*;
use ui::{server_message, use_toast};

use super::AuthCard;
use crate::Route;

#[component]
pub fn ForgotPassword() -> Element {
    let mut toast = use_toast();
    let mut email = use_signal(String::new);
    let mut sent = use_signal(|| false);
    let mut loading = use_signal(|| false);

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            let e = match api::auth::normalize_email(&email()) {
                Ok(e) => e,
                Err(err) => {
                    toast.error("发送失败", err.to_string());
                    return;
                }
            };

            loading.set(true);
            match api::request_password_reset(e).await {
                Ok(()) => {
                    sent.set(true);
                    toast.success("邮件已发送", "请查看邮箱完成密码重置");
                }
                Err(err) => {
                    tracing::warn!("Password reset request failed: {}", err);
                    toast.error("发送失败", server_message(&err));
                }
            }
            loading.set(false);
        });
    };

    rsx! {
        AuthCard {
            title: "重置密码",
            if sent() {
                p { class: "muted", "如果该邮箱已注册，重置链接会发送到你的邮箱，一小时内有效。" }
            } else {
                form {
                    class: "auth-form",
                    onsubmit: handle_submit,
                    label { class: "field-label", "邮箱" }
                    input {
                        class: "input",
                        r#type: "email",
                        placeholder: "邮箱",
                        value: email(),
                        oninput: move |evt: FormEvent| email.set(evt.value()),
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: loading(),
                        if loading() { "发送中..." } else { "发送重置链接" }
                    }
                }
            }
            div {
                class: "auth-links",
                Link { to: Route::Login {}, "返回登录" }
            }
        }
    }
}
