//! Email and password sign-in.

use dioxus::prelude::*;
use ui::{server_message, use_auth, AuthState};

use super::{use_redirect_if_logged_in, AuthCard};
use crate::Route;

#[component]
pub fn Login() -> Element {
    use_redirect_if_logged_in();
    let mut auth = use_auth();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            error.set(None);

            let e = match api::auth::normalize_email(&email()) {
                Ok(e) => e,
                Err(err) => {
                    error.set(Some(err.to_string()));
                    return;
                }
            };

            loading.set(true);
            match api::login_password(e, password()).await {
                Ok(user) => {
                    auth.set(AuthState::signed_in(user));
                    nav.replace(Route::Home {});
                }
                Err(err) => {
                    tracing::warn!("Login failed: {}", err);
                    error.set(Some(server_message(&err)));
                }
            }
            loading.set(false);
        });
    };

    rsx! {
        AuthCard {
            title: "登录 ETHOSLOG",
            form {
                class: "auth-form",
                onsubmit: handle_login,

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
                    placeholder: "密码",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "登录中..." } else { "登录" }
                }
            }

            div {
                class: "auth-links",
                Link { to: Route::ForgotPassword {}, "忘记密码？" }
                Link { to: Route::Register {}, "注册账号" }
            }
        }
    }
}
