//! Plain-text helpers shared by the editor, the server and the analyzer.
//!
//! Entries are markdown, but entries written with the older rich-text editor are
//! stored as HTML, so anything that needs plain text goes through
//! [`html_to_text`] first.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#[^\s#<>]+").unwrap());
static HTML_DETECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?[a-z][\s\S]*>").unwrap());
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collect every `#hashtag` embedded in free text, without the leading `#`.
pub fn extract_tags(text: &str) -> Vec<String> {
    TAG_RE
        .find_iter(text)
        .map(|m| m.as_str()[1..].to_string())
        .collect()
}

/// Normalise a tag typed into the tag input: trim, drop one leading `#`.
/// Returns `None` for tags that end up empty.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let tag = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Whether the content looks like HTML rather than markdown/plain text.
pub fn is_html(text: &str) -> bool {
    HTML_DETECT_RE.is_match(text)
}

/// Strip tags, collapse whitespace and decode the handful of entities the
/// editors emit.
pub fn html_to_text(html: &str) -> String {
    let text = HTML_TAG_RE.replace_all(html, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Convert content to plain text only when it is HTML.
pub fn plain_text(content: &str) -> String {
    if is_html(content) {
        html_to_text(content)
    } else {
        content.to_string()
    }
}

/// Short plain-text preview of an entry, cut on a character boundary.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let text = plain_text(content);
    let text = WHITESPACE_RE.replace_all(text.trim(), " ");
    if text.chars().count() <= max_chars {
        return text.into_owned();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// One bullet of an analysis, e.g. `- 行动建议：每天散步十分钟`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPoint {
    pub label: Option<String>,
    pub body: String,
}

/// Split the analyzer's free-text answer into display bullets.
///
/// Each non-blank line becomes one point; a leading `-` is dropped and the line
/// is split on the first ASCII or full-width colon into label and body.
pub fn analysis_points(analysis: &str) -> Vec<AnalysisPoint> {
    analysis
        .lines()
        .map(str::trim)
        .map(|line| line.strip_prefix('-').unwrap_or(line).trim())
        .filter(|line| !line.is_empty())
        .map(|line| match line.find(|c: char| c == ':' || c == '：') {
            Some(idx) => {
                let sep_len = line[idx..].chars().next().map_or(1, char::len_utf8);
                let label = line[..idx].trim();
                let body = line[idx + sep_len..].trim();
                AnalysisPoint {
                    label: (!label.is_empty()).then(|| label.to_string()),
                    body: body.to_string(),
                }
            }
            None => AnalysisPoint {
                label: None,
                body: line.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tags_strips_hash() {
        let tags = extract_tags("今天 #跑步 了，顺便 #reading#notes 还有 #");
        assert_eq!(tags, vec!["跑步", "reading", "notes"]);
    }

    #[test]
    fn test_extract_tags_stops_at_markup() {
        assert_eq!(extract_tags("<p>#work</p>"), vec!["work"]);
        assert!(extract_tags("no tags here").is_empty());
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(" #rust "), Some("rust".to_string()));
        assert_eq!(normalize_tag("rust"), Some("rust".to_string()));
        assert_eq!(normalize_tag("#"), None);
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("<p>hello</p>"));
        assert!(is_html("text <BR/> more"));
        assert!(!is_html("# heading\n\n- item"));
        assert!(!is_html("1 < 2 and 3 > 2"));
    }

    #[test]
    fn test_html_to_text() {
        let html = "<h1>Title</h1>\n<p>Tom &amp; Jerry&nbsp;say &lt;hi&gt; &quot;ok&quot;</p>";
        assert_eq!(html_to_text(html), "Title Tom & Jerry say <hi> \"ok\"");
    }

    #[test]
    fn test_plain_text_leaves_markdown_alone() {
        assert_eq!(plain_text("**bold**"), "**bold**");
        assert_eq!(plain_text("<b>bold</b>"), "bold");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("今天天气很好适合出门", 4), "今天天气…");
        assert_eq!(excerpt("<p>a   b</p>", 10), "a b");
    }

    #[test]
    fn test_analysis_points() {
        let analysis = "- 个人特质：在工作中坚持复盘\n\n- 模式识别: 压力下拖延\n-行动建议：每天散步十分钟\n总结";
        let points = analysis_points(analysis);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].label.as_deref(), Some("个人特质"));
        assert_eq!(points[0].body, "在工作中坚持复盘");
        assert_eq!(points[1].label.as_deref(), Some("模式识别"));
        assert_eq!(points[1].body, "压力下拖延");
        assert_eq!(points[2].label.as_deref(), Some("行动建议"));
        assert_eq!(points[3].label, None);
        assert_eq!(points[3].body, "总结");
    }
}
