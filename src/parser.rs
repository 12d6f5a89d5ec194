use scraper::{ElementRef, Html, Node};

use crate::block::{Align, Block, BlockStyle, Cell, List, ListItem, Span};
use crate::style::{ALIGN_CLASSES, Stylesheet, indent_class};

/// Elements nested deeper than this are read as plain text.
const MAX_DEPTH: usize = 32;

/// Parse a styled HTML document into a list of blocks.
///
/// Only the `<body>` is read. Alignment classes are recognised as far as the
/// stylesheet defines them.
pub fn parse(html: &str, sheet: &Stylesheet) -> Vec<Block> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or(root);

    let reader = Reader { sheet };
    let mut blocks = Vec::new();
    reader.blocks(body, BlockStyle::default(), 0, &mut blocks);
    blocks
}

enum Child<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

fn children<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = Child<'a>> {
    parent.children().filter_map(|node| match node.value() {
        Node::Text(text) => Some(Child::Text(&**text)),
        Node::Element(_) => ElementRef::wrap(node).map(Child::Element),
        _ => None,
    })
}

fn child_elements<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    parent.children().filter_map(ElementRef::wrap)
}

fn name<'a>(el: ElementRef<'a>) -> &'a str {
    el.value().name()
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

struct Reader<'a> {
    sheet: &'a Stylesheet,
}

impl Reader<'_> {
    fn blocks(
        &self,
        parent: ElementRef<'_>,
        inherited: BlockStyle,
        depth: usize,
        blocks: &mut Vec<Block>,
    ) {
        // Inline content found directly in a container becomes a paragraph.
        let mut pending = Vec::new();

        for child in children(parent) {
            let el = match child {
                Child::Text(text) => {
                    push_text(text, &mut pending);
                    continue;
                }
                Child::Element(el) => el,
            };

            let tag = name(el);
            match tag {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    flush(&mut pending, inherited, blocks);
                    let level = tag[1..].parse().unwrap_or(1);
                    let content = tidy(self.inline_children(el, depth + 1));
                    blocks.push(Block::Heading {
                        level,
                        content,
                        style: self.style_of(el).inherit(inherited),
                    });
                }
                "p" | "dt" | "dd" | "figcaption" | "address" => {
                    flush(&mut pending, inherited, blocks);
                    let content = tidy(self.inline_children(el, depth + 1));
                    if !content.is_empty() {
                        blocks.push(Block::Paragraph {
                            content,
                            style: self.style_of(el).inherit(inherited),
                        });
                    }
                }
                "pre" => {
                    flush(&mut pending, inherited, blocks);
                    let language = el
                        .descendants()
                        .filter_map(ElementRef::wrap)
                        .find(|code| name(*code) == "code")
                        .and_then(|code| {
                            code.value()
                                .classes()
                                .find_map(|class| class.strip_prefix("language-"))
                                .map(str::to_string)
                        });
                    blocks.push(Block::CodeBlock {
                        language,
                        content: text_of(el),
                    });
                }
                "ul" | "ol" => {
                    flush(&mut pending, inherited, blocks);
                    blocks.push(Block::List(self.list(el, depth + 1)));
                }
                "table" => {
                    flush(&mut pending, inherited, blocks);
                    let table = self.table(el, depth + 1);
                    if !table.headers.is_empty() || !table.rows.is_empty() {
                        blocks.push(Block::Table {
                            headers: table.headers,
                            rows: table.rows,
                            header_in_body: table.header_in_body,
                        });
                    }
                }
                "blockquote" => {
                    flush(&mut pending, inherited, blocks);
                    if depth >= MAX_DEPTH {
                        push_text(&text_of(el), &mut pending);
                        flush(&mut pending, inherited, blocks);
                    } else {
                        let mut inner = Vec::new();
                        self.blocks(el, inherited, depth + 1, &mut inner);
                        blocks.push(Block::Quote(inner));
                    }
                }
                "hr" => {
                    flush(&mut pending, inherited, blocks);
                    blocks.push(Block::Rule);
                }
                "head" | "style" | "script" | "title" | "meta" | "link" | "template" => {}
                "html" | "body" | "div" | "section" | "article" | "main" | "header" | "footer"
                | "aside" | "nav" | "figure" | "details" | "summary" | "dl" | "center" => {
                    flush(&mut pending, inherited, blocks);
                    let mut style = self.style_of(el);
                    if tag == "center" {
                        style.align = Some(Align::Center);
                    }
                    let style = style.inherit(inherited);
                    if depth >= MAX_DEPTH {
                        push_text(&text_of(el), &mut pending);
                        flush(&mut pending, style, blocks);
                    } else {
                        self.blocks(el, style, depth + 1, blocks);
                    }
                }
                _ => self.inline(el, &mut pending, depth + 1),
            }
        }

        flush(&mut pending, inherited, blocks);
    }

    fn inline_children(&self, el: ElementRef<'_>, depth: usize) -> Vec<Span> {
        let mut spans = Vec::new();
        self.inline_into(el, &mut spans, depth);
        spans
    }

    fn inline_into(&self, el: ElementRef<'_>, spans: &mut Vec<Span>, depth: usize) {
        for child in children(el) {
            match child {
                Child::Text(text) => push_text(text, spans),
                Child::Element(child) => self.inline(child, spans, depth + 1),
            }
        }
    }

    fn inline(&self, el: ElementRef<'_>, spans: &mut Vec<Span>, depth: usize) {
        if depth >= MAX_DEPTH {
            push_text(&text_of(el), spans);
            return;
        }

        match name(el) {
            "strong" | "b" => spans.push(Span::Bold(self.inline_children(el, depth))),
            "em" | "i" | "cite" | "dfn" | "var" => {
                spans.push(Span::Italic(self.inline_children(el, depth)));
            }
            "del" | "s" | "strike" => spans.push(Span::Strike(self.inline_children(el, depth))),
            "code" | "kbd" | "samp" | "tt" => {
                spans.push(Span::Code(text_of(el).replace(['\n', '\r'], " ")));
            }
            "a" => match el.value().attr("href").filter(|href| !href.is_empty()) {
                Some(url) => spans.push(Span::Link {
                    url: url.to_string(),
                    content: self.inline_children(el, depth),
                }),
                None => self.inline_into(el, spans, depth),
            },
            "br" => spans.push(Span::LineBreak),
            "img" => {
                if let Some(alt) = el.value().attr("alt").filter(|alt| !alt.trim().is_empty()) {
                    spans.push(Span::Italic(vec![Span::Text(alt.trim().to_string())]));
                }
            }
            "style" | "script" | "head" | "title" => {}
            _ => self.inline_into(el, spans, depth),
        }
    }

    fn list(&self, el: ElementRef<'_>, depth: usize) -> List {
        let start = if name(el) == "ol" {
            Some(
                el.value()
                    .attr("start")
                    .and_then(|start| start.trim().parse().ok())
                    .unwrap_or(1),
            )
        } else {
            None
        };

        let items = child_elements(el)
            .filter(|child| name(*child) == "li")
            .map(|li| self.list_item(li, depth + 1))
            .collect();

        List { start, items }
    }

    fn list_item(&self, li: ElementRef<'_>, depth: usize) -> ListItem {
        let mut content = Vec::new();
        let mut nested: Option<Box<List>> = None;

        for child in children(li) {
            let el = match child {
                Child::Text(text) => {
                    push_text(text, &mut content);
                    continue;
                }
                Child::Element(el) => el,
            };
            match name(el) {
                "ul" | "ol" if depth >= MAX_DEPTH => {
                    content.push(Span::LineBreak);
                    push_text(&text_of(el), &mut content);
                }
                "ul" | "ol" => {
                    let list = self.list(el, depth + 1);
                    match nested.as_mut() {
                        Some(existing) => existing.items.extend(list.items),
                        None => nested = Some(Box::new(list)),
                    }
                }
                "p" | "div" | "blockquote" => {
                    if !content.is_empty() {
                        content.push(Span::LineBreak);
                    }
                    self.inline_into(el, &mut content, depth + 1);
                }
                "pre" => {
                    if !content.is_empty() {
                        content.push(Span::LineBreak);
                    }
                    content.push(Span::Code(text_of(el).trim_end().replace('\n', " ")));
                }
                _ => self.inline(el, &mut content, depth + 1),
            }
        }

        ListItem {
            content: tidy(content),
            nested,
        }
    }

    fn table(&self, table: ElementRef<'_>, depth: usize) -> ParsedTable {
        let mut out = ParsedTable::default();

        let mut visit_row = |tr: ElementRef<'_>, in_head: bool| {
            let cells: Vec<ElementRef<'_>> = child_elements(tr)
                .filter(|cell| matches!(name(*cell), "td" | "th"))
                .collect();
            let all_th = !cells.is_empty() && cells.iter().all(|cell| name(*cell) == "th");
            let row: Vec<Cell> = cells
                .into_iter()
                .map(|cell| self.cell(cell, depth + 1))
                .collect();

            if out.headers.is_empty() && out.rows.is_empty() && (in_head || all_th) {
                out.headers = row;
                out.header_in_body = !in_head;
            } else if !row.is_empty() {
                out.rows.push(row);
            }
        };

        for child in child_elements(table) {
            match name(child) {
                "thead" => child_elements(child)
                    .filter(|tr| name(*tr) == "tr")
                    .for_each(|tr| visit_row(tr, true)),
                "tbody" | "tfoot" => child_elements(child)
                    .filter(|tr| name(*tr) == "tr")
                    .for_each(|tr| visit_row(tr, false)),
                "tr" => visit_row(child, false),
                _ => {}
            }
        }

        out
    }

    fn cell(&self, el: ElementRef<'_>, depth: usize) -> Cell {
        Cell {
            content: tidy(self.inline_children(el, depth)),
            align: element_align(el),
        }
    }

    fn style_of(&self, el: ElementRef<'_>) -> BlockStyle {
        let class_align = ALIGN_CLASSES.iter().find_map(|(class, value)| {
            if has_class(el, class) {
                parse_align(value)
            } else {
                None
            }
        });
        let indent = self
            .sheet
            .indents
            .iter()
            .copied()
            .find(|percent| has_class(el, &indent_class(*percent)));

        BlockStyle {
            align: class_align.or_else(|| element_align(el)),
            indent,
        }
    }
}

#[derive(Default)]
struct ParsedTable {
    headers: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
    header_in_body: bool,
}

/// Alignment from an `align` attribute or an inline `text-align` style.
fn element_align(el: ElementRef<'_>) -> Option<Align> {
    if let Some(align) = el.value().attr("align").and_then(parse_align) {
        return Some(align);
    }
    el.value()
        .attr("style")?
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(property, _)| property.trim().eq_ignore_ascii_case("text-align"))
        .and_then(|(_, value)| parse_align(value))
}

fn parse_align(value: &str) -> Option<Align> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" | "start" => Some(Align::Left),
        "center" | "middle" => Some(Align::Center),
        "right" | "end" => Some(Align::Right),
        "justify" => Some(Align::Justify),
        _ => None,
    }
}

/// Append text with runs of whitespace collapsed to one space.
fn push_text(text: &str, spans: &mut Vec<Span>) {
    let mut collapsed = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !last_space {
                collapsed.push(' ');
            }
            last_space = true;
        } else {
            collapsed.push(ch);
            last_space = false;
        }
    }
    if collapsed.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(Span::Text(prev)) => {
            if prev.ends_with(' ') && collapsed.starts_with(' ') {
                prev.push_str(&collapsed[1..]);
            } else {
                prev.push_str(&collapsed);
            }
        }
        _ => spans.push(Span::Text(collapsed)),
    }
}

/// Trim whitespace at the start and end of every line and drop empty text.
fn tidy(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Span::Text(text) => {
                let text = if matches!(out.last(), None | Some(Span::LineBreak)) {
                    text.trim_start().to_string()
                } else {
                    text
                };
                if !text.is_empty() {
                    out.push(Span::Text(text));
                }
            }
            Span::LineBreak => {
                trim_last(&mut out);
                out.push(Span::LineBreak);
            }
            other => out.push(other),
        }
    }
    trim_last(&mut out);

    while matches!(out.last(), Some(Span::LineBreak)) {
        out.pop();
    }
    let leading = out
        .iter()
        .take_while(|span| matches!(span, Span::LineBreak))
        .count();
    out.drain(..leading);
    out
}

fn trim_last(spans: &mut Vec<Span>) {
    if let Some(Span::Text(text)) = spans.last_mut() {
        let len = text.trim_end().len();
        text.truncate(len);
        if text.is_empty() {
            spans.pop();
        }
    }
}

fn flush(pending: &mut Vec<Span>, style: BlockStyle, blocks: &mut Vec<Block>) {
    let content = tidy(std::mem::take(pending));
    if !content.is_empty() {
        blocks.push(Block::Paragraph { content, style });
    }
}
