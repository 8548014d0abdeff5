//! Page files inside a notes directory.

pub mod page_file;

use relative_path::RelativePathBuf;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::PageId;

pub use page_file::{PageFile, parse_page_file, render_page_file};

const PAGE_EXTENSION: &str = "md";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(PathBuf),
}

impl IoError {
    fn at(path: &Path) -> impl FnOnce(std::io::Error) -> IoError + '_ {
        move |source| IoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidNotesDir(path.to_path_buf()));
    }
    Ok(())
}

/// Where a page lives relative to the notes directory.
///
/// Characters that cannot appear in file names are replaced with `-`. The
/// result never leaves the notes directory: empty and `.` folders are
/// dropped and `..` becomes `-`.
pub fn page_relative_path(page: &PageId) -> RelativePathBuf {
    let name: String = page
        .as_str()
        .chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();

    let parts: Vec<&str> = name
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .map(|part| if part == ".." { "-" } else { part })
        .collect();
    let stem = if parts.is_empty() { "-".to_string() } else { parts.join("/") };
    RelativePathBuf::from(format!("{stem}.{PAGE_EXTENSION}"))
}

/// Text of a page's file, or `None` when the page has no file yet.
pub fn read_page(notes_root: &Path, page: &PageId) -> Result<Option<String>, IoError> {
    let path = page_relative_path(page).to_path(notes_root);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(IoError::at(&path)(err)),
    }
}

/// Replace a page's file, creating folders for nested pages.
pub fn write_page(notes_root: &Path, page: &PageId, text: &str) -> Result<(), IoError> {
    let path = page_relative_path(page).to_path(notes_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::at(parent))?;
    }
    fs::write(&path, text).map_err(IoError::at(&path))
}

/// Page ids for every page file under the notes directory, sorted.
///
/// Nested files keep their folder: `projects/alpha.md` is page
/// `projects/alpha`. Hidden folders are skipped.
pub fn scan_page_ids(notes_root: &Path) -> Result<Vec<PageId>, IoError> {
    validate_notes_dir(notes_root)?;
    let mut pages = Vec::new();
    scan_directory_recursive(notes_root, notes_root, &mut pages)?;
    pages.sort();
    Ok(pages)
}

fn scan_directory_recursive(
    root: &Path,
    dir: &Path,
    pages: &mut Vec<PageId>,
) -> Result<(), IoError> {
    for entry in fs::read_dir(dir).map_err(IoError::at(dir))? {
        let path = entry.map_err(IoError::at(dir))?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }

        if path.is_dir() {
            scan_directory_recursive(root, &path, pages)?;
        } else if path.extension().is_some_and(|ext| ext == PAGE_EXTENSION)
            && let Some(id) = page_id_for(root, &path)
        {
            pages.push(id);
        }
    }
    Ok(())
}

fn page_id_for(root: &Path, file: &Path) -> Option<PageId> {
    let relative = RelativePathBuf::from_path(file.strip_prefix(root).ok()?).ok()?;
    let name = relative.as_str();
    let name = name
        .strip_suffix(PAGE_EXTENSION)
        .and_then(|name| name.strip_suffix('.'))
        .unwrap_or(name);
    Some(PageId::new(name))
}
