use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Read a Markdown file as UTF-8 text.
///
/// Directories and other non-regular files are rejected as [`Error::FileAccess`];
/// bytes that are not UTF-8 are reported as [`Error::Decoding`] rather than
/// replaced.
pub fn load(path: &Path) -> Result<String> {
    let file_access = |source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(file_access)?;
    if !metadata.is_file() {
        return Err(file_access(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let bytes = fs::read(path).map_err(file_access)?;
    let text = String::from_utf8(bytes).map_err(|source| Error::Decoding {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = text.len(), "loaded markdown");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_content_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.md");
        let sample = "# Hello\n\nThis is a **test**.\r\n\n– ünïcödé ✓\n";
        fs::write(&path, sample).unwrap();

        assert_eq!(load(&path).unwrap(), sample);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.md")).unwrap_err();
        match err {
            Error::FileAccess { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("expected FileAccess, got {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(Error::FileAccess { .. })));
    }

    #[test]
    fn invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.md");
        fs::write(&path, b"caf\xe9\n").unwrap();

        assert!(matches!(load(&path), Err(Error::Decoding { .. })));
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        fs::write(&path, "").unwrap();

        assert_eq!(load(&path).unwrap(), "");
    }
}
