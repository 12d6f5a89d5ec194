/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Strike(Vec<Span>),
    Code(String),
    Link { url: String, content: Vec<Span> },
    LineBreak,
}

/// Horizontal alignment requested through a class, attribute or inline style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

/// Alignment and indentation of a paragraph or heading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStyle {
    pub align: Option<Align>,
    /// Left margin in percent of the text width
    pub indent: Option<u8>,
}

impl BlockStyle {
    /// Fill unset properties from an enclosing container.
    pub fn inherit(self, outer: BlockStyle) -> Self {
        Self {
            align: self.align.or(outer.align),
            indent: self.indent.or(outer.indent),
        }
    }
}

/// A single list item, which can contain nested content
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Span>,
    pub nested: Option<Box<List>>,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// First number of an ordered list
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub content: Vec<Span>,
    pub align: Option<Align>,
}

/// Block-level elements read from the styled document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Span>,
        style: BlockStyle,
    },
    Paragraph {
        content: Vec<Span>,
        style: BlockStyle,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    List(List),
    Table {
        headers: Vec<Cell>,
        rows: Vec<Vec<Cell>>,
        /// The header row shares its parent with the body rows, so even-row
        /// striping counts it.
        header_in_body: bool,
    },
    Quote(Vec<Block>),
    Rule,
}
