//! The stylesheet embedded in every generated document.
//!
//! [`Stylesheet`] is a plain value so the injector and the renderer read the
//! same settings: [`Stylesheet::to_css`] produces the `<style>` block placed in
//! the HTML head, and the Typst renderer derives its set rules from the same
//! fields.

use std::fmt::Write as _;

/// Text alignment helper classes, as `(class, css value)`.
pub const ALIGN_CLASSES: [(&str, &str); 3] = [
    ("text-right", "right"),
    ("text-center", "center"),
    ("text-justify", "justify"),
];

/// Cell alignments honoured through an `align` attribute.
pub const CELL_ALIGNMENTS: [&str; 3] = ["left", "center", "right"];

#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// Font families in order of preference; the last is usually a generic family.
    pub font_family: Vec<String>,
    pub font_size_px: f32,
    pub line_height: f32,
    /// Colour of h1 to h3.
    pub heading_color: String,
    pub paragraph_spacing_em: f32,
    /// Left margins in percent for the `right-NN` classes.
    pub indents: Vec<u8>,
    pub table: TableStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub border_px: f32,
    pub border_color: String,
    pub cell_padding_px: f32,
    pub header_background: String,
    pub stripe_background: String,
    pub margin_em: f32,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            font_family: vec!["Arial".to_string(), "sans-serif".to_string()],
            font_size_px: 14.0,
            line_height: 1.6,
            heading_color: "#333".to_string(),
            paragraph_spacing_em: 1.0,
            indents: vec![40, 50, 60],
            table: TableStyle::default(),
        }
    }
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            border_px: 1.0,
            border_color: "#ddd".to_string(),
            cell_padding_px: 8.0,
            header_background: "#f2f2f2".to_string(),
            stripe_background: "#f9f9f9".to_string(),
            margin_em: 1.0,
        }
    }
}

/// Class name for a `margin-left: {percent}%` indentation.
pub fn indent_class(percent: u8) -> String {
    format!("right-{percent}")
}

impl Stylesheet {
    /// Render the stylesheet as a `<style>` element.
    pub fn to_css(&self) -> String {
        let mut css = String::from("\n<style>\n");
        let families = self
            .font_family
            .iter()
            .map(|family| css_family(family))
            .collect::<Vec<_>>()
            .join(", ");

        let _ = writeln!(
            css,
            "    body {{ font-family: {families}; line-height: {}; font-size: {}px; }}",
            self.line_height, self.font_size_px
        );
        let _ = writeln!(css, "    h1, h2, h3 {{ color: {}; }}", self.heading_color);
        let _ = writeln!(
            css,
            "    p {{ margin-bottom: {}em; }}",
            self.paragraph_spacing_em
        );
        for (class, value) in ALIGN_CLASSES {
            let _ = writeln!(css, "    .{class} {{ text-align: {value}; }}");
        }
        for percent in &self.indents {
            let _ = writeln!(
                css,
                "    .{} {{ margin-left: {percent}%; }}",
                indent_class(*percent)
            );
        }

        let table = &self.table;
        let _ = writeln!(
            css,
            "    table {{ border-collapse: collapse; width: 100%; margin: {}em 0; }}",
            table.margin_em
        );
        let _ = writeln!(
            css,
            "    th, td {{ border: {}px solid {}; padding: {}px; }}",
            table.border_px, table.border_color, table.cell_padding_px
        );
        let _ = writeln!(
            css,
            "    th {{ background-color: {}; }}",
            table.header_background
        );
        let _ = writeln!(
            css,
            "    tr:nth-child(even) {{ background-color: {}; }}",
            table.stripe_background
        );
        for align in CELL_ALIGNMENTS {
            let _ = writeln!(
                css,
                "    th[align=\"{align}\"], td[align=\"{align}\"] {{ text-align: {align}; }}"
            );
        }
        css.push_str("</style>\n");
        css
    }

    /// Wrap an HTML fragment in a complete document carrying this stylesheet.
    pub fn wrap(&self, fragment: &str) -> String {
        format!(
            "<html><head>{}</head><body>{fragment}</body></html>",
            self.to_css()
        )
    }
}

/// Wrap an HTML fragment using the default stylesheet.
pub fn wrap(fragment: &str) -> String {
    Stylesheet::default().wrap(fragment)
}

fn css_family(family: &str) -> String {
    const GENERIC: [&str; 5] = ["serif", "sans-serif", "monospace", "cursive", "fantasy"];
    if GENERIC.contains(&family) || !family.contains(char::is_whitespace) {
        family.to_string()
    } else {
        format!("'{family}'")
    }
}
