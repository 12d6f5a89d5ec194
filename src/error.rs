//! Error types for the conversion pipeline.
//!
//! [`Error`] is what [`crate::convert`] returns; the three variants map to the
//! three places the pipeline can fail: reading the input, decoding it, and
//! rendering the PDF. [`ConfigError`] is kept apart because configuration is
//! loaded by the caller before a conversion starts.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by a conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is missing, unreadable, or not a regular file.
    #[error("cannot read '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input was read but is not valid UTF-8.
    #[error("'{}' is not valid UTF-8: {source}", path.display())]
    Decoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures of the PDF rendering stage.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The layout engine rejected the generated document.
    #[error("layout failed: {0}")]
    Compile(String),

    /// The laid out document could not be serialised as PDF.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn file_access_display_names_path_and_cause() {
        let e = Error::FileAccess {
            path: PathBuf::from("notes.md"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.md"), "got: {msg}");
        assert!(msg.contains("No such file"), "got: {msg}");
    }

    #[test]
    fn render_error_is_transparent() {
        let e = Error::from(RenderError::Compile("unknown variable".into()));
        assert_eq!(e.to_string(), "layout failed: unknown variable");
    }

    #[test]
    fn invalid_config_display() {
        let e = ConfigError::Invalid {
            key: "page.margin",
            reason: "expected a length".into(),
        };
        assert!(e.to_string().contains("page.margin"));
    }
}
