//! HTML to PDF rendering.

use std::fs;
use std::path::Path;

use tracing::debug;
use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use crate::config::{Config, FontConfig, PageConfig};
use crate::error::RenderError;
use crate::parser;
use crate::style::Stylesheet;
use crate::typst;

/// Turns a complete HTML document into a PDF file.
pub trait Renderer {
    /// Render `html` and write the PDF to `destination`, replacing any
    /// existing file.
    fn render(&self, html: &str, destination: &Path) -> Result<(), RenderError>;
}

/// Lays out HTML with Typst.
///
/// The HTML is lowered to Typst markup; the document's own `<style>` element
/// is not interpreted. Visual rules come from the renderer's [`Stylesheet`],
/// which should be the sheet the document was wrapped with.
#[derive(Debug, Clone, Default)]
pub struct TypstRenderer {
    stylesheet: Stylesheet,
    page: PageConfig,
    font: FontConfig,
}

impl TypstRenderer {
    pub fn new(stylesheet: Stylesheet, config: &Config) -> Self {
        Self {
            stylesheet,
            page: config.page.clone(),
            font: config.font.clone(),
        }
    }

    /// The Typst markup the HTML document lowers to.
    pub fn to_typst(&self, html: &str) -> String {
        let blocks = parser::parse(html, &self.stylesheet);
        typst::blocks_to_typst(&blocks, &self.stylesheet, &self.page)
    }

    /// Render the HTML document to PDF bytes.
    pub fn to_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let typst_content = self.to_typst(html);
        debug!(bytes = typst_content.len(), "generated typst markup");

        let font_options = TypstKitFontOptions::new()
            .include_embedded_fonts(true)
            .include_system_fonts(self.font.system);

        let engine = TypstEngine::builder()
            .main_file(typst_content)
            .search_fonts_with(font_options)
            .build();

        let compiled = engine.compile();
        for warning in &compiled.warnings {
            debug!(message = %warning.message, "typst warning");
        }
        let doc: PagedDocument = compiled
            .output
            .map_err(|e| RenderError::Compile(format!("{:?}", e)))?;
        debug!(pages = doc.pages.len(), "laid out document");

        typst_pdf::pdf(&doc, &PdfOptions::default())
            .map_err(|e| RenderError::Pdf(format!("{:?}", e)))
    }
}

impl Renderer for TypstRenderer {
    fn render(&self, html: &str, destination: &Path) -> Result<(), RenderError> {
        let pdf = self.to_pdf(html)?;
        fs::write(destination, &pdf).map_err(|source| RenderError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
        debug!(path = %destination.display(), bytes = pdf.len(), "wrote pdf");
        Ok(())
    }
}
