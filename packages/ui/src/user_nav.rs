use dioxus::prelude::*;

use crate::{use_auth, Avatar, LogoutButton};

/// Avatar button with the account menu.
#[component]
pub fn UserNav(#[props(default = "/profile".to_string())] profile_href: String) -> Element {
    let auth = use_auth();
    let mut menu_open = use_signal(|| false);

    let Some(user) = auth().user else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "user-nav",
            button {
                class: "user-nav-trigger",
                title: "{user.display_name()}",
                onclick: move |_| menu_open.toggle(),
                Avatar {
                    url: user.avatar_url.clone(),
                    initial: user.initial(),
                    size: 32,
                }
            }
            if menu_open() {
                div {
                    class: "user-nav-menu",
                    onclick: move |_| menu_open.set(false),
                    div {
                        class: "user-nav-header",
                        div { class: "user-nav-name", "{user.display_name()}" }
                        div { class: "muted small", "{user.email}" }
                    }
                    Link { class: "user-nav-item", to: profile_href.clone(), "个人资料" }
                    LogoutButton { class: "user-nav-item" }
                }
            }
        }
    }
}
