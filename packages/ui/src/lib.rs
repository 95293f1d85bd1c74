//! This crate contains all shared UI for the workspace.
//!
//! Components are route-agnostic: anything that navigates takes a callback or
//! a plain path, so the web crate owns the `Route` enum.

use dioxus::prelude::*;

pub const VIEWS_CSS: Asset = asset!("/assets/views.css");

mod auth;
pub use auth::{use_auth, AuthProvider, AuthState, LogoutButton};

mod toast;
pub use toast::{use_toast, ToastKind, Toaster, Toasts};

pub mod format;

mod markdown;
pub use markdown::{render_markdown, MarkdownView};

mod diary_editor;
pub use diary_editor::{merge_tags, DiaryEditor};

mod analysis_view;
pub use analysis_view::AnalysisView;

mod diary_card;
pub use diary_card::DiaryCard;

mod avatar_upload;
pub use avatar_upload::{Avatar, AvatarUpload};

mod location_autocomplete;
pub use location_autocomplete::{friendly_location_error, LocationAutocomplete};

mod user_nav;
pub use user_nav::UserNav;

mod modal;
pub use modal::{ConfirmDialog, ModalOverlay};

/// Wait without blocking the UI thread.
pub async fn sleep_ms(ms: u32) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(ms).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(std::time::Duration::from_millis(u64::from(ms))).await;
}

/// The message a server function failed with, without the transport prefix.
pub fn server_message(err: &ServerFnError) -> String {
    strip_server_prefix(&err.to_string()).to_string()
}

fn strip_server_prefix(message: &str) -> &str {
    const PREFIXES: [&str; 2] = ["error running server function: ", "ServerFnError: "];
    PREFIXES
        .iter()
        .find_map(|p| message.strip_prefix(p))
        .unwrap_or(message)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_server_prefix() {
        assert_eq!(
            strip_server_prefix("error running server function: 请先登录"),
            "请先登录"
        );
        assert_eq!(strip_server_prefix("邮箱或密码错误"), "邮箱或密码错误");
    }
}
