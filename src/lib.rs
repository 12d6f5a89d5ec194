//! Convert Markdown documents to styled PDF files.
//!
//! The pipeline is strictly linear: the Markdown file is loaded, converted to
//! an HTML fragment, wrapped in a document carrying the stylesheet, and handed
//! to a [`Renderer`] that writes the PDF.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let input = Path::new("notes.md");
//! md2pdf::convert(input, &md2pdf::default_output_path(input))?;
//! # Ok::<(), md2pdf::Error>(())
//! ```

mod block;
mod config;
mod error;
mod loader;
mod markdown;
mod parser;
mod render;
mod style;
mod typst;

pub use block::{Align, Block, BlockStyle, Cell, List, ListItem, Span};
pub use config::{Config, FontConfig, MarkdownConfig, PageConfig};
pub use error::{ConfigError, Error, RenderError, Result};
pub use loader::load;
pub use render::{Renderer, TypstRenderer};
pub use style::{Stylesheet, TableStyle, wrap};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Convert markdown to an HTML fragment with the default extensions.
pub fn markdown_to_html(markdown: &str) -> String {
    markdown::to_html(markdown, &MarkdownConfig::default())
}

/// Convert markdown to an HTML fragment with the given extensions.
pub fn markdown_to_html_with(markdown: &str, extensions: &MarkdownConfig) -> String {
    markdown::to_html(markdown, extensions)
}

/// Parse a styled HTML document into the blocks the renderer lays out.
pub fn parse_html(html: &str, stylesheet: &Stylesheet) -> Vec<Block> {
    parser::parse(html, stylesheet)
}

/// The PDF path used when none is given: the input's final extension is
/// replaced by `.pdf`, or `.pdf` is appended when there is none.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// Convert a Markdown file to PDF using default config.
pub fn convert(source: &Path, destination: &Path) -> Result<()> {
    convert_with_config(source, destination, &Config::default())
}

/// Convert a Markdown file to PDF with custom config.
pub fn convert_with_config(source: &Path, destination: &Path, config: &Config) -> Result<()> {
    let stylesheet = Stylesheet::default();
    let renderer = TypstRenderer::new(stylesheet.clone(), config);
    convert_with(source, destination, &config.markdown, &stylesheet, &renderer)
}

/// Run the pipeline with an explicit stylesheet and renderer.
///
/// The first failing stage aborts the conversion. Nothing is written when
/// the source cannot be read; a failed render may leave whatever the
/// renderer wrote.
pub fn convert_with<R: Renderer>(
    source: &Path,
    destination: &Path,
    extensions: &MarkdownConfig,
    stylesheet: &Stylesheet,
    renderer: &R,
) -> Result<()> {
    let text = loader::load(source)?;

    let fragment = markdown::to_html(&text, extensions);
    debug!(bytes = fragment.len(), "converted markdown to html");

    let document = stylesheet.wrap(&fragment);
    renderer.render(&document, destination)?;

    info!(
        source = %source.display(),
        destination = %destination.display(),
        "converted"
    );
    Ok(())
}
