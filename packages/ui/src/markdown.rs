//! Markdown rendering for diary previews.
//!
//! Raw HTML in the source is never passed through: block and inline HTML are
//! emitted as escaped text, and links or images with a script-capable scheme
//! lose their destination. Entries stored as HTML by the old editor are shown
//! as plain text.

use dioxus::prelude::*;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use store::text::{html_to_text, is_html};

use crate::VIEWS_CSS;

fn parser_options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    !(lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:"))
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Render markdown to sanitized HTML.
pub fn render_markdown(source: &str) -> String {
    if source.trim_start().starts_with('<') && is_html(source) {
        return format!("<p>{}</p>", html_escape(&html_to_text(source)));
    }

    let events = Parser::new_ext(source, parser_options()).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut html_out = String::new();
    pulldown_cmark::html::push_html(&mut html_out, events);
    html_out
}

/// Read-only rendering of diary content.
#[component]
pub fn MarkdownView(content: String, #[props(default)] class: String) -> Element {
    let html = render_markdown(&content);

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "markdown-body {class}",
            dangerous_inner_html: "{html}",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_basic_markdown() {
        let html = render_markdown("# 标题\n\n**粗体** ~~删~~\n\n- [x] 完成");
        assert!(html.contains("<h1>标题</h1>"));
        assert!(html.contains("<strong>粗体</strong>"));
        assert!(html.contains("<del>删</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("hello <script>alert(1)</script> world");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_script_links_are_neutralised() {
        let html = render_markdown("[click](javascript:alert(1)) ![x](https://a.b/c.png)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("src=\"https://a.b/c.png\""));
    }

    #[test]
    fn test_legacy_html_entries_render_as_text() {
        let html = render_markdown("<p>旧的<b>日记</b></p>");
        assert_eq!(html, "<p>旧的 日记</p>");
    }
}
