//! Markdown to HTML, on top of pulldown-cmark.
//!
//! pulldown-cmark covers tables and heading attributes natively. Two extensions
//! are layered on its event stream here: soft breaks turned into hard breaks,
//! and block attribute lists (`{: .class #id key=value}`) on the last line of a
//! paragraph.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, TextMergeStream, html};
use regex::Regex;

use crate::config::MarkdownConfig;

static RE_ATTR_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{:?\s*([^{}]*?)\s*\}$").unwrap());

static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([.#]?[A-Za-z_][\w:-]*)(?:=("[^"]*"|'[^']*'|[^\s"']+))?"#).unwrap()
});

/// Convert Markdown text to an HTML fragment.
pub fn to_html(markdown: &str, extensions: &MarkdownConfig) -> String {
    let mut options = Options::empty();
    if extensions.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if extensions.attr_lists {
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    }

    let events = TextMergeStream::new(Parser::new_ext(markdown, options)).map(|event| match event {
        Event::SoftBreak if extensions.newline_to_break => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    if extensions.attr_lists {
        html::push_html(&mut out, apply_attr_lists(events.collect()).into_iter());
    } else {
        html::push_html(&mut out, events);
    }
    out
}

/// Parsed contents of a `{: ...}` attribute list.
#[derive(Debug, Default, PartialEq)]
struct Attributes {
    id: Option<String>,
    classes: Vec<String>,
    pairs: Vec<(String, String)>,
}

impl Attributes {
    fn parse(source: &str) -> Self {
        let mut attrs = Self::default();
        for caps in RE_ATTR.captures_iter(source) {
            let name = &caps[1];
            if let Some(class) = name.strip_prefix('.') {
                attrs.classes.push(class.to_string());
            } else if let Some(id) = name.strip_prefix('#') {
                attrs.id = Some(id.to_string());
            } else if let Some(value) = caps.get(2) {
                let value = value.as_str();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                    .unwrap_or(value);
                attrs.pairs.push((name.to_string(), value.to_string()));
            }
        }
        attrs
    }

    fn open_tag(&self, tag: &str) -> String {
        let mut out = format!("<{tag}");
        if let Some(id) = &self.id {
            let _ = write!(out, " id=\"{}\"", escape_attr(id));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_attr(&self.classes.join(" ")));
        }
        for (name, value) in &self.pairs {
            let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
        }
        out.push('>');
        out
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Move a trailing `{: ...}` line of each paragraph onto its `<p>` tag.
fn apply_attr_lists(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut open = None;
    let mut i = 0;
    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Paragraph) => open = Some(i),
            Event::End(TagEnd::Paragraph) => {
                if let Some(start) = open.take() {
                    if let Some(removed) = take_attr_list(&mut events, start, i) {
                        i -= removed;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    events
}

/// Returns how many events were removed from the paragraph when an
/// attribute list was found.
fn take_attr_list(events: &mut Vec<Event<'_>>, start: usize, end: usize) -> Option<usize> {
    let last = end - 1;
    if last <= start {
        return None;
    }
    let attrs = match &events[last] {
        Event::Text(text) => {
            let caps = RE_ATTR_LIST.captures(text.trim())?;
            Attributes::parse(&caps[1])
        }
        _ => return None,
    };
    // The attribute list must sit on a line of its own.
    let on_own_line = last == start + 1
        || matches!(events[last - 1], Event::SoftBreak | Event::HardBreak);
    if !on_own_line {
        return None;
    }

    let first_removed = if last == start + 1 { last } else { last - 1 };
    events.drain(first_removed..=last);
    let removed = last - first_removed + 1;

    events[start] = Event::Html(attrs.open_tag("p").into());
    events[end - removed] = Event::Html("</p>\n".into());
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(markdown: &str) -> String {
        to_html(markdown, &MarkdownConfig::default())
    }

    fn plain(markdown: &str) -> String {
        to_html(
            markdown,
            &MarkdownConfig {
                tables: false,
                attr_lists: false,
                newline_to_break: false,
            },
        )
    }

    #[test]
    fn heading_and_strong() {
        assert_eq!(
            convert("# Hello\n\nThis is a **test**."),
            "<h1>Hello</h1>\n<p>This is a <strong>test</strong>.</p>\n"
        );
    }

    #[test]
    fn table() {
        let html = convert("| A | B |\n|---|--:|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<th>A</th>"), "got: {html}");
        assert!(html.contains("text-align: right"), "got: {html}");
    }

    #[test]
    fn tables_disabled() {
        assert!(!plain("| A | B |\n|---|---|\n| 1 | 2 |").contains("<table>"));
    }

    #[test]
    fn newline_to_break() {
        assert_eq!(convert("one\ntwo"), "<p>one<br />\ntwo</p>\n");
        assert_eq!(plain("one\ntwo"), "<p>one\ntwo</p>\n");
    }

    #[test]
    fn paragraph_attr_list() {
        assert_eq!(
            convert("Signed, the author\n{: .text-right #sig }"),
            "<p id=\"sig\" class=\"text-right\">Signed, the author</p>\n"
        );
    }

    #[test]
    fn attr_list_without_colon_and_with_pairs() {
        assert_eq!(
            convert("Closing words\n{.right-50 .text-justify title=\"a b\"}"),
            "<p class=\"right-50 text-justify\" title=\"a b\">Closing words</p>\n"
        );
    }

    #[test]
    fn attr_list_must_be_on_own_line() {
        let html = convert("Just some text {: .text-right}");
        assert!(html.starts_with("<p>Just some text"), "got: {html}");
    }

    #[test]
    fn attr_list_in_later_paragraph() {
        let html = convert("First\n\nSecond\n{: .text-center}\n\nThird");
        assert_eq!(
            html,
            "<p>First</p>\n<p class=\"text-center\">Second</p>\n<p>Third</p>\n"
        );
    }

    #[test]
    fn attr_list_ignored_when_disabled() {
        assert!(plain("Text\n{: .text-right}").contains("{: .text-right}"));
    }

    #[test]
    fn heading_attributes() {
        assert_eq!(
            convert("## Summary {.text-center}"),
            "<h2 class=\"text-center\">Summary</h2>\n"
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let attrs = Attributes::parse(r#"data-x='<a href="y">'"#);
        assert_eq!(
            attrs.open_tag("p"),
            "<p data-x=\"&lt;a href=&quot;y&quot;&gt;\">"
        );
    }
}
