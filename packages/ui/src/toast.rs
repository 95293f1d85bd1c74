//! Transient notifications shown in the bottom corner.

use dioxus::prelude::*;

/// How long a toast stays on screen.
const TOAST_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
}

/// Handle to the toast list provided by [`Toaster`].
#[derive(Clone, Copy, PartialEq)]
pub struct Toasts {
    items: Signal<Vec<Toast>>,
    next_id: Signal<u64>,
}

impl Toasts {
    pub fn success(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(ToastKind::Success, title.into(), description.into());
    }

    pub fn error(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(ToastKind::Error, title.into(), description.into());
    }

    fn push(&mut self, kind: ToastKind, title: String, description: String) {
        let id = *self.next_id.peek();
        self.next_id.set(id + 1);
        self.items.write().push(Toast {
            id,
            kind,
            title,
            description,
        });

        let mut items = self.items;
        spawn(async move {
            crate::sleep_ms(TOAST_MS).await;
            items.write().retain(|t| t.id != id);
        });
    }

    fn dismiss(&mut self, id: u64) {
        self.items.write().retain(|t| t.id != id);
    }
}

/// Access the toast list. Must be called below a [`Toaster`].
pub fn use_toast() -> Toasts {
    use_context::<Toasts>()
}

/// Provides [`use_toast`] to its children and renders the active toasts.
#[component]
pub fn Toaster(children: Element) -> Element {
    let items = use_signal(Vec::<Toast>::new);
    let next_id = use_signal(|| 0u64);
    let mut toasts = use_context_provider(|| Toasts { items, next_id });

    rsx! {
        {children}
        div {
            class: "toaster",
            for toast in items() {
                div {
                    key: "{toast.id}",
                    class: if toast.kind == ToastKind::Error { "toast toast-error" } else { "toast" },
                    onclick: move |_| toasts.dismiss(toast.id),
                    div { class: "toast-title", "{toast.title}" }
                    if !toast.description.is_empty() {
                        div { class: "toast-description", "{toast.description}" }
                    }
                }
            }
        }
    }
}
