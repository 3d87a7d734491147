//! Reading exports from disk and naming the files written back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions accepted for highlight exports (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("unsupported file type for {path}: expected a .md, .markdown, or .txt file")]
    UnsupportedType { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A document loaded from disk together with the name it was loaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub name: String,
    pub contents: String,
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Read a highlight export, rejecting unsupported extensions before touching the disk.
pub fn read_document(path: &Path) -> Result<LoadedFile, FileError> {
    if !is_supported(path) {
        return Err(FileError::UnsupportedType {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(path = %path.display(), bytes = contents.len(), "loaded document");
    Ok(LoadedFile {
        path: path.to_path_buf(),
        name,
        contents,
    })
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_document(path: &Path, contents: &str) -> Result<(), FileError> {
    let write_err = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote document");
    Ok(())
}

/// Name for converted output: `<stem><suffix>.md`, or `fallback` without an original name.
pub fn converted_file_name(original: Option<&str>, suffix: &str, fallback: &str) -> String {
    let Some(original) = original.filter(|name| !name.trim().is_empty()) else {
        return fallback.to_string();
    };
    let path = Path::new(original);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext)
            if SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported)) =>
        {
            let stem = &original[..original.len() - ext.len() - 1];
            format!("{stem}{suffix}.md")
        }
        _ => original.to_string(),
    }
}

/// Default location for converted output next to the input file.
pub fn converted_path(input: &Path, suffix: &str, fallback: &str) -> PathBuf {
    let name = input.file_name().map(|name| name.to_string_lossy());
    let file_name = converted_file_name(name.as_deref(), suffix, fallback);
    input.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_names_replace_supported_extensions() {
        assert_eq!(
            converted_file_name(Some("atomic-habits.md"), "-converted", "converted-notes.md"),
            "atomic-habits-converted.md"
        );
        assert_eq!(
            converted_file_name(Some("Notes.TXT"), "-converted", "converted-notes.md"),
            "Notes-converted.md"
        );
        assert_eq!(
            converted_file_name(Some("book.markdown"), "-x", "converted-notes.md"),
            "book-x.md"
        );
        assert_eq!(
            converted_file_name(None, "-converted", "converted-notes.md"),
            "converted-notes.md"
        );
    }

    #[test]
    fn converted_path_sits_next_to_input() {
        let path = converted_path(Path::new("/tmp/books/deep.md"), "-converted", "x.md");
        assert_eq!(path, PathBuf::from("/tmp/books/deep-converted.md"));
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let err = read_document(Path::new("highlights.pdf")).unwrap_err();
        assert!(matches!(err, FileError::UnsupportedType { .. }));
        assert!(is_supported(Path::new("a.MarkDown")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn reads_and_writes_documents() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/notes.md");
        write_document(&path, "Hello\n---\nWorld").unwrap();
        let loaded = read_document(&path).unwrap();
        assert_eq!(loaded.name, "notes.md");
        assert_eq!(loaded.contents, "Hello\n---\nWorld");
    }

    #[test]
    fn missing_file_reports_read_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = read_document(&temp.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }
}
