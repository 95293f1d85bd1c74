//! Registration page view with email/password form.

use dioxus::prelude::*;
use ui::{server_message, use_auth, use_toast, AuthState};

use super::{use_redirect_if_logged_in, AuthCard};
use crate::Route;

/// Register page component.
#[component]
pub fn Register() -> Element {
    use_redirect_if_logged_in();
    let mut auth = use_auth();
    let nav = use_navigator();
    let mut toast = use_toast();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_register = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            error.set(None);

            let checked = api::auth::normalize_email(&email()).and_then(|e| {
                api::auth::validate_new_password(&password(), &confirm_password()).map(|()| e)
            });
            let e = match checked {
                Ok(e) => e,
                Err(err) => {
                    error.set(Some(err.to_string()));
                    return;
                }
            };

            loading.set(true);
            match api::register(e, password()).await {
                Ok(user) => {
                    auth.set(AuthState::signed_in(user));
                    toast.success("注册成功", "欢迎来到 ETHOSLOG");
                    nav.replace(Route::Home {});
                }
                Err(err) => {
                    tracing::warn!("Registration failed: {}", err);
                    error.set(Some(server_message(&err)));
                }
            }
            loading.set(false);
        });
    };

    rsx! {
        AuthCard {
            title: "注册 ETHOSLOG",
            form {
                class: "auth-form",
                onsubmit: handle_register,

                if let Some(err) = error() {
                    div { class: "form-error", "{err}" }
                }

                label { class: "field-label", "邮箱" }
                input {
                    class: "input",
                    r#type: "email",
                    placeholder: "邮箱",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                label { class: "field-label", "密码" }
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
                    if loading() { "注册中..." } else { "注册" }
                }
            }

            p {
                class: "auth-links",
                "已有账号？"
                Link { to: Route::Login {}, "登录" }
            }
        }
    }
}
