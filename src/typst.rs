use std::fmt::Write as _;

use crate::block::{Align, Block, BlockStyle, Cell, List, Span};
use crate::config::PageConfig;
use crate::style::Stylesheet;

/// Lists with more items than this may break across pages.
const MAX_UNBREAKABLE_LIST_ITEMS: usize = 5;
/// Tables with more body rows than this may break across pages.
const MAX_UNBREAKABLE_TABLE_ROWS: usize = 10;
/// Code blocks with more lines than this may break across pages.
const MAX_UNBREAKABLE_CODE_LINES: usize = 20;

const TYPST_COLORS: [&str; 18] = [
    "black", "gray", "silver", "white", "navy", "blue", "aqua", "teal", "eastern", "purple",
    "fuchsia", "maroon", "red", "orange", "yellow", "olive", "green", "lime",
];

/// Convert blocks to a complete Typst document styled after `sheet`
pub fn blocks_to_typst(blocks: &[Block], sheet: &Stylesheet, page: &PageConfig) -> String {
    let mut out = String::new();
    preamble(blocks, sheet, page, &mut out);
    emit_blocks(blocks, &mut out);
    out
}

/// Set and show rules equivalent to the stylesheet
fn preamble(blocks: &[Block], sheet: &Stylesheet, page: &PageConfig, out: &mut String) {
    if let Some(title) = document_title(blocks) {
        let _ = writeln!(out, "#set document(title: {})", string_literal(&title));
    }

    let numbering = if page.numbers { "\"1\"" } else { "none" };
    let _ = writeln!(
        out,
        "#set page(paper: {}, margin: {}, numbering: {numbering})",
        string_literal(page.paper.trim()),
        page.margin.trim()
    );
    let _ = writeln!(
        out,
        "#set text(font: {}, size: {}pt)",
        font_list(&sheet.font_family),
        px_to_pt(sheet.font_size_px)
    );
    // CSS line-height is the full line box; Typst leading is the gap between lines.
    let leading = (sheet.line_height - 1.0).max(0.0);
    let _ = writeln!(
        out,
        "#set par(leading: {leading:.2}em, spacing: {}em, linebreaks: \"optimized\")",
        sheet.paragraph_spacing_em
    );
    for level in 1..=3 {
        let _ = writeln!(
            out,
            "#show heading.where(level: {level}): set text(fill: {})",
            color(&sheet.heading_color)
        );
    }
    let table = &sheet.table;
    let _ = writeln!(
        out,
        "#set table(stroke: {}pt + {}, inset: {}pt)",
        px_to_pt(table.border_px),
        color(&table.border_color),
        px_to_pt(table.cell_padding_px)
    );
    let _ = writeln!(out, "#let header-fill = {}", color(&table.header_background));
    let _ = writeln!(out, "#let stripe-fill = {}", color(&table.stripe_background));
    out.push('\n');
}

fn emit_blocks(blocks: &[Block], out: &mut String) {
    let mut i = 0;
    while i < blocks.len() {
        let block = &blocks[i];

        match block {
            Block::Heading { .. } => {
                // Keep heading with following content using a block that prevents breaks
                out.push_str("#block(breakable: false)[\n");
                emit_block(block, out);

                if let Some(next) = blocks.get(i + 1).filter(|next| fits_on_page(next)) {
                    i += 1;
                    emit_block(next, out);
                }
                out.push_str("]\n\n");
            }
            _ => {
                emit_block(block, out);
            }
        }

        i += 1;
    }
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading {
            level,
            content,
            style,
        } => {
            let mut heading = "=".repeat(usize::from(*level));
            heading.push(' ');
            spans_to_typst(content, &mut heading);
            // Justification has no meaning for a single heading line.
            let style = BlockStyle {
                align: style.align.filter(|align| *align != Align::Justify),
                ..*style
            };
            styled(style, heading, out);
        }
        Block::Paragraph { content, style } => {
            let mut text = String::new();
            spans_to_typst(content, &mut text);
            styled(*style, text, out);
        }
        Block::CodeBlock { language, content } => {
            let mut raw = String::from("#raw(");
            raw.push_str(&string_literal(content.trim_end_matches('\n')));
            raw.push_str(", block: true");
            if let Some(lang) = language {
                let _ = write!(raw, ", lang: {}", string_literal(lang));
            }
            raw.push(')');

            // Keep code blocks together when possible
            if fits_on_page(block) {
                let _ = write!(out, "#block(breakable: false)[\n{raw}\n]\n\n");
            } else {
                out.push_str(&raw);
                out.push_str("\n\n");
            }
        }
        Block::List(list) => {
            // Wrap list to keep together when small, allow breaks when large
            if fits_on_page(block) {
                out.push_str("#block(breakable: false)[\n");
                list_to_typst(list, 0, out);
                out.push_str("]\n\n");
            } else {
                list_to_typst(list, 0, out);
                out.push('\n');
            }
        }
        Block::Table {
            headers,
            rows,
            header_in_body,
        } => {
            table_to_typst(headers, rows, *header_in_body, fits_on_page(block), out);
        }
        Block::Quote(inner) => {
            out.push_str("#quote(block: true)[\n");
            emit_blocks(inner, out);
            out.push_str("]\n\n");
        }
        Block::Rule => {
            out.push_str("#line(length: 100%)\n\n");
        }
    }
}

/// Whether a block is small enough to be kept on a single page.
fn fits_on_page(block: &Block) -> bool {
    match block {
        Block::Heading { .. } | Block::Paragraph { .. } | Block::Rule => true,
        Block::CodeBlock { content, .. } => content.lines().count() <= MAX_UNBREAKABLE_CODE_LINES,
        Block::List(list) => count_list_items(list) <= MAX_UNBREAKABLE_LIST_ITEMS,
        Block::Table { rows, .. } => rows.len() <= MAX_UNBREAKABLE_TABLE_ROWS,
        Block::Quote(_) => false,
    }
}

fn styled(style: BlockStyle, body: String, out: &mut String) {
    let body = match style.align {
        Some(Align::Justify) => format!("#block[\n#set par(justify: true)\n{body}\n]"),
        Some(align) => format!("#align({})[\n{body}\n]", align_name(align)),
        None => body,
    };
    let body = match style.indent {
        Some(percent) => format!("#pad(left: {percent}%)[\n{body}\n]"),
        None => body,
    };
    out.push_str(&body);
    out.push_str("\n\n");
}

fn align_name(align: Align) -> &'static str {
    match align {
        Align::Left | Align::Justify => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

fn count_list_items(list: &List) -> usize {
    let mut count = list.items.len();
    for item in &list.items {
        if let Some(ref nested) = item.nested {
            count += count_list_items(nested);
        }
    }
    count
}

fn spans_to_typst(spans: &[Span], out: &mut String) {
    for span in spans {
        span_to_typst(span, out);
    }
}

fn span_to_typst(span: &Span, out: &mut String) {
    match span {
        Span::Text(text) => escape_text(text, out),
        Span::Bold(inner) => {
            out.push_str("#strong[");
            spans_to_typst(inner, out);
            out.push_str("];");
        }
        Span::Italic(inner) => {
            out.push_str("#emph[");
            spans_to_typst(inner, out);
            out.push_str("];");
        }
        Span::Strike(inner) => {
            out.push_str("#strike[");
            spans_to_typst(inner, out);
            out.push_str("];");
        }
        Span::Code(text) => {
            out.push_str("#raw(");
            out.push_str(&string_literal(text));
            out.push_str(");");
        }
        Span::Link { url, content } => {
            out.push_str("#link(");
            out.push_str(&string_literal(url));
            out.push_str(")[");
            if content.is_empty() {
                escape_text(url, out);
            } else {
                spans_to_typst(content, out);
            }
            out.push_str("];");
        }
        Span::LineBreak => {
            out.push_str(" \\ ");
        }
    }
}

/// Escape characters that carry meaning in Typst markup.
fn escape_text(text: &str, out: &mut String) {
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        let special = match ch {
            '\\' | '#' | '*' | '_' | '@' | '$' | '`' | '<' | '>' | '[' | ']' | '~' | '/' | '='
            | '-' | '+' | '"' | '\'' | '{' | '}' => true,
            // "1." at the start of a line would open a numbered list
            '.' => prev.is_some_and(|p| p.is_ascii_digit()),
            _ => false,
        };
        if special {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }
}

/// A Typst string literal.
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn list_to_typst(list: &List, indent: usize, out: &mut String) {
    let indent_str: String = "  ".repeat(indent);

    for (n, item) in list.items.iter().enumerate() {
        out.push_str(&indent_str);
        match list.start {
            Some(1) => out.push('+'),
            Some(start) => {
                let _ = write!(out, "{}.", start.saturating_add(n as u64));
            }
            None => out.push('-'),
        }
        out.push(' ');
        spans_to_typst(&item.content, out);
        out.push('\n');

        if let Some(ref nested) = item.nested {
            list_to_typst(nested, indent + 1, out);
        }
    }
}

fn table_to_typst(
    headers: &[Cell],
    rows: &[Vec<Cell>],
    header_in_body: bool,
    keep_together: bool,
    out: &mut String,
) {
    let col_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if col_count == 0 {
        return;
    }

    let _ = writeln!(out, "#block(above: 1em, below: 1em, breakable: {})[", !keep_together);
    out.push_str("#table(\n");
    let _ = writeln!(out, "  columns: (1fr,) * {col_count},");

    if headers.is_empty() {
        out.push_str("  fill: (_, y) => if calc.odd(y) { stripe-fill },\n");
    } else {
        // Typst numbers the header row 0; `nth-child` counts it only inside the body.
        let stripe = if header_in_body { "odd" } else { "even" };
        let _ = writeln!(
            out,
            "  fill: (_, y) => if y == 0 {{ header-fill }} else if calc.{stripe}(y) {{ stripe-fill }},"
        );
        out.push_str("  table.header(");
        for i in 0..col_count {
            if i > 0 {
                out.push_str(", ");
            }
            match headers.get(i) {
                Some(cell) => {
                    // Header cells are bold and centred unless aligned explicitly.
                    let _ = write!(
                        out,
                        "table.cell(align: {})[#strong[",
                        align_name(cell.align.unwrap_or(Align::Center))
                    );
                    spans_to_typst(&cell.content, out);
                    out.push_str("];]");
                }
                None => out.push_str("[]"),
            }
        }
        out.push_str("),\n");
    }

    // Data rows
    for row in rows {
        for i in 0..col_count {
            out.push_str("  ");
            match row.get(i) {
                Some(cell) => cell_to_typst(cell, out),
                None => out.push_str("[]"),
            }
            out.push_str(",\n");
        }
    }

    out.push_str(")\n]\n\n");
}

fn cell_to_typst(cell: &Cell, out: &mut String) {
    if let Some(align) = cell.align {
        let _ = write!(out, "table.cell(align: {})", align_name(align));
    }
    out.push('[');
    spans_to_typst(&cell.content, out);
    out.push(']');
}

fn document_title(blocks: &[Block]) -> Option<String> {
    blocks.iter().find_map(|block| match block {
        Block::Heading {
            level: 1, content, ..
        } => {
            let mut title = String::new();
            plain_text(content, &mut title);
            let title = title.trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        _ => None,
    })
}

fn plain_text(spans: &[Span], out: &mut String) {
    for span in spans {
        match span {
            Span::Text(text) | Span::Code(text) => out.push_str(text),
            Span::Bold(inner) | Span::Italic(inner) | Span::Strike(inner) => plain_text(inner, out),
            Span::Link { content, .. } => plain_text(content, out),
            Span::LineBreak => out.push(' '),
        }
    }
}

fn px_to_pt(px: f32) -> f32 {
    px * 0.75
}

fn color(css: &str) -> String {
    let css = css.trim();
    if css.starts_with('#') {
        format!("rgb({})", string_literal(css))
    } else if TYPST_COLORS.contains(&css.to_ascii_lowercase().as_str()) {
        css.to_ascii_lowercase()
    } else {
        "black".to_string()
    }
}

/// Typst has no generic families, so those are replaced by concrete fonts.
/// The embedded Libertinus Serif is always last so text never lacks glyphs.
fn font_list(families: &[String]) -> String {
    let mut fonts: Vec<&str> = Vec::new();
    for family in families {
        let candidates: &[&str] = match family.trim() {
            "sans-serif" => &["Liberation Sans", "DejaVu Sans", "Noto Sans"],
            "serif" => &["Libertinus Serif"],
            "monospace" => &["DejaVu Sans Mono"],
            other => {
                if !fonts.contains(&other) {
                    fonts.push(other);
                }
                continue;
            }
        };
        for font in candidates {
            if !fonts.contains(font) {
                fonts.push(*font);
            }
        }
    }
    if !fonts.contains(&"Libertinus Serif") {
        fonts.push("Libertinus Serif");
    }

    let mut out = String::from("(");
    for font in fonts {
        out.push_str(&string_literal(font));
        out.push_str(", ");
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ListItem;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    fn para(content: Vec<Span>) -> Block {
        Block::Paragraph {
            content,
            style: BlockStyle::default(),
        }
    }

    /// Body markup without the preamble
    fn body(blocks: &[Block]) -> String {
        let mut out = String::new();
        emit_blocks(blocks, &mut out);
        out
    }

    #[test]
    fn heading_groups_with_following_paragraph() {
        let blocks = vec![
            Block::Heading {
                level: 1,
                content: vec![text("Title")],
                style: BlockStyle::default(),
            },
            para(vec![text("Some text.")]),
        ];
        assert_eq!(
            body(&blocks),
            "#block(breakable: false)[\n= Title\n\nSome text.\n\n]\n\n"
        );
    }

    #[test]
    fn inline_formatting() {
        let blocks = vec![para(vec![
            text("This is a "),
            Span::Bold(vec![text("test")]),
            text(", "),
            Span::Italic(vec![text("really")]),
            text(" "),
            Span::Code("a \"b\"".to_string()),
            text("."),
        ])];
        assert_eq!(
            body(&blocks),
            "This is a #strong[test];, #emph[really]; #raw(\"a \\\"b\\\"\");.\n\n"
        );
    }

    #[test]
    fn escapes_special_chars() {
        let mut out = String::new();
        escape_text("a * b # c_d [x] // 1. - 2.5", &mut out);
        assert_eq!(out, "a \\* b \\# c\\_d \\[x\\] \\/\\/ 1\\. \\- 2\\.5");
    }

    #[test]
    fn line_break() {
        assert_eq!(
            body(&[para(vec![text("one"), Span::LineBreak, text("two")])]),
            "one \\ two\n\n"
        );
    }

    #[test]
    fn aligned_and_indented_paragraph() {
        let blocks = vec![Block::Paragraph {
            content: vec![text("Regards")],
            style: BlockStyle {
                align: Some(Align::Right),
                indent: Some(40),
            },
        }];
        assert_eq!(
            body(&blocks),
            "#pad(left: 40%)[\n#align(right)[\nRegards\n]\n]\n\n"
        );
    }

    #[test]
    fn justified_paragraph() {
        let blocks = vec![Block::Paragraph {
            content: vec![text("x")],
            style: BlockStyle {
                align: Some(Align::Justify),
                indent: None,
            },
        }];
        assert_eq!(body(&blocks), "#block[\n#set par(justify: true)\nx\n]\n\n");
    }

    #[test]
    fn code_block() {
        let blocks = vec![Block::CodeBlock {
            language: Some("rust".to_string()),
            content: "let x = 1;\n".to_string(),
        }];
        assert_eq!(
            body(&blocks),
            "#block(breakable: false)[\n#raw(\"let x = 1;\", block: true, lang: \"rust\")\n]\n\n"
        );
    }

    #[test]
    fn lists() {
        let item = |s: &str| ListItem {
            content: vec![text(s)],
            nested: None,
        };
        let nested = List {
            start: None,
            items: vec![item("a")],
        };
        let blocks = vec![Block::List(List {
            start: Some(1),
            items: vec![
                ListItem {
                    content: vec![text("one")],
                    nested: Some(Box::new(nested)),
                },
                item("two"),
            ],
        })];
        assert_eq!(
            body(&blocks),
            "#block(breakable: false)[\n+ one\n  - a\n+ two\n]\n\n"
        );

        let numbered = vec![Block::List(List {
            start: Some(4),
            items: vec![item("four"), item("five")],
        })];
        assert!(body(&numbered).contains("4. four\n5. five\n"));
    }

    #[test]
    fn long_list_may_break() {
        let items = (0..8)
            .map(|i| ListItem {
                content: vec![text(&i.to_string())],
                nested: None,
            })
            .collect();
        let out = body(&[Block::List(List { start: None, items })]);
        assert!(!out.contains("breakable: false"));
    }

    #[test]
    fn table() {
        let cell = |s: &str, align| Cell {
            content: vec![text(s)],
            align,
        };
        let blocks = vec![Block::Table {
            headers: vec![cell("A", None), cell("B", Some(Align::Right))],
            rows: vec![vec![cell("1", None), cell("2", Some(Align::Right))], vec![cell("3", None)]],
            header_in_body: false,
        }];
        let expected = "#block(above: 1em, below: 1em, breakable: false)[\n#table(\n  columns: (1fr,) * 2,\n  fill: (_, y) => if y == 0 { header-fill } else if calc.even(y) { stripe-fill },\n  table.header(table.cell(align: center)[#strong[A];], table.cell(align: right)[#strong[B];]),\n  [1],\n  table.cell(align: right)[2],\n  [3],\n  [],\n)\n]\n\n";
        assert_eq!(body(&blocks), expected);
    }

    #[test]
    fn header_row_in_body_shifts_stripes() {
        let cell = |s: &str| Cell {
            content: vec![text(s)],
            align: None,
        };
        let blocks = vec![Block::Table {
            headers: vec![cell("K")],
            rows: vec![vec![cell("a")], vec![cell("b")]],
            header_in_body: true,
        }];
        assert!(body(&blocks).contains(
            "fill: (_, y) => if y == 0 { header-fill } else if calc.odd(y) { stripe-fill },"
        ));
    }

    #[test]
    fn list_numbers_saturate() {
        let item = |s: &str| ListItem {
            content: vec![text(s)],
            nested: None,
        };
        let blocks = vec![Block::List(List {
            start: Some(u64::MAX),
            items: vec![item("a"), item("b")],
        })];
        assert!(body(&blocks).contains("18446744073709551615. a\n18446744073709551615. b\n"));
    }

    #[test]
    fn links() {
        let blocks = vec![para(vec![Span::Link {
            url: "https://example.com/a_b".to_string(),
            content: vec![text("site")],
        }])];
        assert_eq!(
            body(&blocks),
            "#link(\"https://example.com/a_b\")[site];\n\n"
        );
    }

    #[test]
    fn preamble_follows_stylesheet() {
        let blocks = vec![Block::Heading {
            level: 1,
            content: vec![text("My "), Span::Bold(vec![text("Doc")])],
            style: BlockStyle::default(),
        }];
        let out = blocks_to_typst(&blocks, &Stylesheet::default(), &PageConfig::default());
        assert!(out.starts_with("#set document(title: \"My Doc\")\n"));
        assert!(out.contains("#set page(paper: \"a4\", margin: 2cm, numbering: none)"));
        assert!(out.contains(
            "#set text(font: (\"Arial\", \"Liberation Sans\", \"DejaVu Sans\", \"Noto Sans\", \"Libertinus Serif\", ), size: 10.5pt)"
        ));
        assert!(out.contains("#set par(leading: 0.60em, spacing: 1em"));
        assert!(out.contains("#show heading.where(level: 3): set text(fill: rgb(\"#333\"))"));
        assert!(out.contains("#set table(stroke: 0.75pt + rgb(\"#ddd\"), inset: 6pt)"));
        assert!(out.contains("#let header-fill = rgb(\"#f2f2f2\")"));
        assert!(out.contains("#let stripe-fill = rgb(\"#f9f9f9\")"));
    }

    #[test]
    fn page_numbers() {
        let page = PageConfig {
            numbers: true,
            ..PageConfig::default()
        };
        let out = blocks_to_typst(&[], &Stylesheet::default(), &page);
        assert!(out.contains("numbering: \"1\""));
        assert!(!out.contains("#set document"));
    }

    #[test]
    fn named_and_unknown_colors() {
        assert_eq!(color("Navy"), "navy");
        assert_eq!(color("rebeccapurple"), "black");
        assert_eq!(color("#1a4f8b"), "rgb(\"#1a4f8b\")");
    }
}
