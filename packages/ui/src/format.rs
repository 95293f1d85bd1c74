//! Text transformations behind the editor toolbar.
//!
//! Every action takes the current text and selection and returns the new text
//! and the selection to restore. Offsets are byte offsets into the text; the
//! browser reports selections in UTF-16 code units, see [`utf16_to_byte`] and
//! [`byte_to_utf16`].
//!
//! Inline actions (bold, italic, strikethrough, code) toggle: applying one to
//! text that is already wrapped removes the markers. Line actions (heading,
//! quote, lists) apply to every line touched by the selection.

/// Deepest indentation level reachable with the indent button.
pub const MAX_INDENT_LEVEL: usize = 7;
const INDENT: &str = "  ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatAction {
    Bold,
    Italic,
    Strikethrough,
    Heading,
    Quote,
    Code,
    CodeBlock,
    Link,
    BulletList,
    OrderedList,
    TaskList,
    Indent,
    Outdent,
}

impl FormatAction {
    pub const TOOLBAR: [FormatAction; 13] = [
        FormatAction::Bold,
        FormatAction::Italic,
        FormatAction::Strikethrough,
        FormatAction::Heading,
        FormatAction::Quote,
        FormatAction::Code,
        FormatAction::CodeBlock,
        FormatAction::Link,
        FormatAction::BulletList,
        FormatAction::OrderedList,
        FormatAction::TaskList,
        FormatAction::Indent,
        FormatAction::Outdent,
    ];

    /// Short glyph shown on the toolbar button.
    pub fn glyph(&self) -> &'static str {
        match self {
            FormatAction::Bold => "B",
            FormatAction::Italic => "I",
            FormatAction::Strikethrough => "S",
            FormatAction::Heading => "H",
            FormatAction::Quote => "❝",
            FormatAction::Code => "</>",
            FormatAction::CodeBlock => "{ }",
            FormatAction::Link => "🔗",
            FormatAction::BulletList => "•",
            FormatAction::OrderedList => "1.",
            FormatAction::TaskList => "☑",
            FormatAction::Indent => "→",
            FormatAction::Outdent => "←",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormatAction::Bold => "粗体",
            FormatAction::Italic => "斜体",
            FormatAction::Strikethrough => "删除线",
            FormatAction::Heading => "标题",
            FormatAction::Quote => "引用",
            FormatAction::Code => "行内代码",
            FormatAction::CodeBlock => "代码块",
            FormatAction::Link => "链接",
            FormatAction::BulletList => "无序列表",
            FormatAction::OrderedList => "有序列表",
            FormatAction::TaskList => "任务列表",
            FormatAction::Indent => "增加缩进",
            FormatAction::Outdent => "减少缩进",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn cursor(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub text: String,
    pub selection: Selection,
}

fn floor_boundary(text: &str, mut at: usize) -> usize {
    at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn clamp(text: &str, selection: Selection) -> Selection {
    let end = floor_boundary(text, selection.end.max(selection.start));
    let start = floor_boundary(text, selection.start.min(end));
    Selection { start, end }
}

/// Byte offset of a UTF-16 offset reported by the browser.
pub fn utf16_to_byte(text: &str, units: usize) -> usize {
    let mut count = 0;
    for (idx, c) in text.char_indices() {
        if count >= units {
            return idx;
        }
        count += c.len_utf16();
    }
    text.len()
}

/// UTF-16 offset of a byte offset, for handing a selection back to the browser.
pub fn byte_to_utf16(text: &str, byte: usize) -> usize {
    text[..floor_boundary(text, byte)].encode_utf16().count()
}

/// Apply a toolbar action.
pub fn apply(text: &str, selection: Selection, action: FormatAction) -> Edit {
    let selection = clamp(text, selection);
    match action {
        FormatAction::Bold => wrap(text, selection, "**", "粗体"),
        FormatAction::Italic => wrap(text, selection, "*", "斜体"),
        FormatAction::Strikethrough => wrap(text, selection, "~~", "删除线"),
        FormatAction::Code => wrap(text, selection, "`", "代码"),
        FormatAction::Link => link(text, selection),
        FormatAction::CodeBlock => code_block(text, selection),
        FormatAction::Heading => map_lines(text, selection, |lines| {
            lines.iter().map(|l| cycle_heading(l)).collect()
        }),
        FormatAction::Quote => map_lines(text, selection, |lines| toggle_prefix(lines, "> ")),
        FormatAction::BulletList => map_lines(text, selection, |lines| toggle_list(lines, ListKind::Bullet)),
        FormatAction::OrderedList => {
            map_lines(text, selection, |lines| toggle_list(lines, ListKind::Ordered))
        }
        FormatAction::TaskList => map_lines(text, selection, |lines| toggle_list(lines, ListKind::Task)),
        FormatAction::Indent => map_lines(text, selection, |lines| {
            lines.iter().map(|l| indent(l)).collect()
        }),
        FormatAction::Outdent => map_lines(text, selection, |lines| {
            lines.iter().map(|l| outdent(l)).collect()
        }),
    }
}

fn wrap(text: &str, sel: Selection, marker: &str, placeholder: &str) -> Edit {
    let selected = &text[sel.start..sel.end];
    let m = marker.len();

    if text[..sel.start].ends_with(marker) && text[sel.end..].starts_with(marker) {
        let new_text = format!(
            "{}{}{}",
            &text[..sel.start - m],
            selected,
            &text[sel.end + m..]
        );
        return Edit {
            text: new_text,
            selection: Selection::new(sel.start - m, sel.end - m),
        };
    }

    let inner = if selected.is_empty() { placeholder } else { selected };
    let new_text = format!(
        "{}{marker}{inner}{marker}{}",
        &text[..sel.start],
        &text[sel.end..]
    );
    Edit {
        text: new_text,
        selection: Selection::new(sel.start + m, sel.start + m + inner.len()),
    }
}

fn link(text: &str, sel: Selection) -> Edit {
    const URL: &str = "https://";
    let selected = &text[sel.start..sel.end];
    let label = if selected.is_empty() { "链接文本" } else { selected };
    let new_text = format!("{}[{label}]({URL}){}", &text[..sel.start], &text[sel.end..]);
    let url_start = sel.start + label.len() + 3;
    Edit {
        text: new_text,
        selection: Selection::new(url_start, url_start + URL.len()),
    }
}

fn code_block(text: &str, sel: Selection) -> Edit {
    let before = &text[..sel.start];
    let after = &text[sel.end..];
    let selected = &text[sel.start..sel.end];
    let inner = if selected.is_empty() { "代码" } else { selected };

    let lead = if before.is_empty() || before.ends_with('\n') { "" } else { "\n" };
    let trail = if after.is_empty() || after.starts_with('\n') { "" } else { "\n" };
    let opening = format!("{lead}```\n");

    let new_text = format!("{before}{opening}{inner}\n```{trail}{after}");
    let inner_start = sel.start + opening.len();
    Edit {
        text: new_text,
        selection: Selection::new(inner_start, inner_start + inner.len()),
    }
}

/// Replace the full lines touched by the selection with `f(lines)`.
fn map_lines(text: &str, sel: Selection, f: impl FnOnce(&[&str]) -> Vec<String>) -> Edit {
    let mut end = sel.end;
    // A selection ending right after a newline does not touch the next line.
    if end > sel.start && text[..end].ends_with('\n') {
        end -= 1;
    }
    let line_start = text[..sel.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);

    let lines: Vec<&str> = text[line_start..line_end].split('\n').collect();
    let block = f(&lines).join("\n");

    let new_text = format!("{}{}{}", &text[..line_start], block, &text[line_end..]);
    let block_end = line_start + block.len();
    let selection = if sel.is_empty() {
        Selection::cursor(block_end)
    } else {
        Selection::new(line_start, block_end)
    };
    Edit {
        text: new_text,
        selection,
    }
}

fn split_indent(line: &str) -> (&str, &str) {
    let rest = line.trim_start_matches(' ');
    (&line[..line.len() - rest.len()], rest)
}

/// `# ` → `## ` → ... → `###### ` → plain.
fn cycle_heading(line: &str) -> String {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    let rest = &line[hashes..];
    if hashes == 0 {
        return format!("# {line}");
    }
    if !rest.starts_with(' ') && !rest.is_empty() {
        // `#tag` is a hashtag, not a heading.
        return format!("# {line}");
    }
    let body = rest.strip_prefix(' ').unwrap_or(rest);
    if hashes >= 6 {
        body.to_string()
    } else {
        format!("{} {body}", "#".repeat(hashes + 1))
    }
}

fn toggle_prefix(lines: &[&str], prefix: &str) -> Vec<String> {
    let targets: Vec<&&str> = lines
        .iter()
        .filter(|l| !l.trim().is_empty() || lines.len() == 1)
        .collect();
    let all_prefixed = !targets.is_empty() && targets.iter().all(|l| l.starts_with(prefix));

    lines
        .iter()
        .map(|&line| {
            if all_prefixed {
                line.strip_prefix(prefix).unwrap_or(line).to_string()
            } else if (line.trim().is_empty() && lines.len() > 1) || line.starts_with(prefix) {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
    Task,
}

fn ordered_marker_len(rest: &str) -> Option<usize> {
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    (digits > 0 && rest[digits..].starts_with(". ")).then_some(digits + 2)
}

/// The list kind of a line body and the length of its marker.
fn list_marker(rest: &str) -> Option<(ListKind, usize)> {
    for task in ["- [ ] ", "- [x] ", "- [X] "] {
        if rest.starts_with(task) {
            return Some((ListKind::Task, task.len()));
        }
    }
    if rest.starts_with("- ") || rest.starts_with("* ") || rest.starts_with("+ ") {
        return Some((ListKind::Bullet, 2));
    }
    ordered_marker_len(rest).map(|len| (ListKind::Ordered, len))
}

fn toggle_list(lines: &[&str], kind: ListKind) -> Vec<String> {
    let skip_blank = lines.len() > 1;
    let all_of_kind = lines
        .iter()
        .filter(|l| !(skip_blank && l.trim().is_empty()))
        .all(|l| matches!(list_marker(split_indent(l).1), Some((k, _)) if k == kind));

    let mut number = 0;
    lines
        .iter()
        .map(|line| {
            if skip_blank && line.trim().is_empty() {
                return line.to_string();
            }
            let (indent, rest) = split_indent(line);
            let body = match list_marker(rest) {
                Some((_, len)) => &rest[len..],
                None => rest,
            };
            if all_of_kind {
                return format!("{indent}{body}");
            }
            number += 1;
            match kind {
                ListKind::Bullet => format!("{indent}- {body}"),
                ListKind::Ordered => format!("{indent}{number}. {body}"),
                ListKind::Task => format!("{indent}- [ ] {body}"),
            }
        })
        .collect()
}

fn indent(line: &str) -> String {
    let (lead, _) = split_indent(line);
    if line.trim().is_empty() || lead.len() / INDENT.len() >= MAX_INDENT_LEVEL {
        line.to_string()
    } else {
        format!("{INDENT}{line}")
    }
}

fn outdent(line: &str) -> String {
    let (lead, _) = split_indent(line);
    let remove = lead.len().min(INDENT.len());
    line[remove..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, start: usize, end: usize, action: FormatAction) -> Edit {
        apply(text, Selection::new(start, end), action)
    }

    #[test]
    fn test_bold_wraps_selection() {
        let edit = run("hello world", 6, 11, FormatAction::Bold);
        assert_eq!(edit.text, "hello **world**");
        assert_eq!(&edit.text[edit.selection.start..edit.selection.end], "world");
    }

    #[test]
    fn test_bold_toggles_off() {
        let edit = run("hello **world**", 8, 13, FormatAction::Bold);
        assert_eq!(edit.text, "hello world");
        assert_eq!(edit.selection, Selection::new(6, 11));
    }

    #[test]
    fn test_empty_selection_inserts_placeholder() {
        let edit = run("今天", 6, 6, FormatAction::Strikethrough);
        assert_eq!(edit.text, "今天~~删除线~~");
        assert_eq!(&edit.text[edit.selection.start..edit.selection.end], "删除线");
    }

    #[test]
    fn test_link_selects_url() {
        let edit = run("看这里", 3, 9, FormatAction::Link);
        assert_eq!(edit.text, "看[这里](https://)");
        assert_eq!(&edit.text[edit.selection.start..edit.selection.end], "https://");
    }

    #[test]
    fn test_code_block_on_own_lines() {
        let edit = run("abc def", 4, 7, FormatAction::CodeBlock);
        assert_eq!(edit.text, "abc \n```\ndef\n```");
        assert_eq!(&edit.text[edit.selection.start..edit.selection.end], "def");
    }

    #[test]
    fn test_heading_cycles_levels() {
        let edit = run("标题", 0, 0, FormatAction::Heading);
        assert_eq!(edit.text, "# 标题");
        let edit = run(&edit.text, 0, 0, FormatAction::Heading);
        assert_eq!(edit.text, "## 标题");
        let edit = run("###### x", 0, 0, FormatAction::Heading);
        assert_eq!(edit.text, "x");
        let edit = run("#跑步", 0, 0, FormatAction::Heading);
        assert_eq!(edit.text, "# #跑步");
    }

    #[test]
    fn test_quote_applies_to_touched_lines() {
        let text = "one\ntwo\nthree";
        let edit = run(text, 1, 5, FormatAction::Quote);
        assert_eq!(edit.text, "> one\n> two\nthree");
        let edit = run(&edit.text, 0, 11, FormatAction::Quote);
        assert_eq!(edit.text, "one\ntwo\nthree");
    }

    #[test]
    fn test_ordered_list_numbers_lines() {
        let edit = run("a\n\nb\nc", 0, 6, FormatAction::OrderedList);
        assert_eq!(edit.text, "1. a\n\n2. b\n3. c");
    }

    #[test]
    fn test_task_list_replaces_bullets_and_toggles() {
        let edit = run("- a\n- b", 0, 7, FormatAction::TaskList);
        assert_eq!(edit.text, "- [ ] a\n- [ ] b");
        let edit = run(&edit.text, 0, edit.text.len(), FormatAction::TaskList);
        assert_eq!(edit.text, "a\nb");
    }

    #[test]
    fn test_bullet_list_cursor_moves_to_line_end() {
        let edit = run("first\nsecond", 8, 8, FormatAction::BulletList);
        assert_eq!(edit.text, "first\n- second");
        assert_eq!(edit.selection, Selection::cursor(edit.text.len()));
    }

    #[test]
    fn test_indent_is_capped() {
        let deep = format!("{}x", "  ".repeat(MAX_INDENT_LEVEL));
        assert_eq!(run(&deep, 0, 0, FormatAction::Indent).text, deep);
        assert_eq!(run("- x", 0, 0, FormatAction::Indent).text, "  - x");
        assert_eq!(run("   - x", 0, 0, FormatAction::Outdent).text, " - x");
        assert_eq!(run("x", 0, 0, FormatAction::Outdent).text, "x");
    }

    #[test]
    fn test_selection_ending_at_line_start_excludes_next_line() {
        let edit = run("a\nb", 0, 2, FormatAction::BulletList);
        assert_eq!(edit.text, "- a\nb");
    }

    #[test]
    fn test_utf16_conversion() {
        let text = "日记😀a";
        assert_eq!(utf16_to_byte(text, 2), 6);
        assert_eq!(utf16_to_byte(text, 4), 10);
        assert_eq!(utf16_to_byte(text, 99), text.len());
        assert_eq!(byte_to_utf16(text, 10), 4);
        assert_eq!(byte_to_utf16(text, 7), 2);
    }

    #[test]
    fn test_out_of_range_selection_is_clamped() {
        let edit = run("ab", 5, 9, FormatAction::Italic);
        assert_eq!(edit.text, "ab*斜体*");
    }
}
