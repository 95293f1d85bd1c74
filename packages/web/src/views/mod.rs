use dioxus::prelude::*;
use ui::{use_auth, UserNav};

use crate::Route;

mod home;
pub use home::Home;

mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod forgot_password;
pub use forgot_password::ForgotPassword;

mod reset_password;
pub use reset_password::ResetPassword;

mod diary_create;
pub use diary_create::DiaryCreate;

mod diary_detail;
pub use diary_detail::DiaryDetail;

mod diary_edit;
pub use diary_edit::DiaryEdit;

mod profile;
pub use profile::Profile;

/// Send anonymous visitors to the login page once the session check is done.
pub(crate) fn use_require_login() {
    let auth = use_auth();
    let nav = use_navigator();
    use_effect(move || {
        if auth().needs_login() {
            nav.replace(Route::Login {});
        }
    });
}

/// Send logged-in visitors away from the login and register pages.
pub(crate) fn use_redirect_if_logged_in() {
    let auth = use_auth();
    let nav = use_navigator();
    use_effect(move || {
        if auth().user.is_some() {
            nav.replace(Route::Home {});
        }
    });
}

/// Page title bar with the account menu.
#[component]
pub(crate) fn AppHeader(#[props(default)] back: bool) -> Element {
    let nav = use_navigator();
    rsx! {
        header {
            class: "card app-header",
            div {
                class: "app-header-left",
                if back {
                    button {
                        class: "btn-icon",
                        title: "返回",
                        onclick: move |_| {
                            nav.go_back();
                        },
                        "←"
                    }
                }
                Link { class: "brand", to: Route::Home {}, "ETHOSLOG" }
            }
            UserNav {}
        }
    }
}

/// Centered card used by the auth pages.
#[component]
pub(crate) fn AuthCard(title: String, children: Element) -> Element {
    rsx! {
        main {
            class: "auth-page",
            div {
                class: "card auth-card",
                h1 { class: "auth-title", "{title}" }
                {children}
            }
        }
    }
}
