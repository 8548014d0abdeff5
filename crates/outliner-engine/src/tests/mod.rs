use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::models::{Block, PageData, PageId};

/// Create a temporary notes directory with test files
pub fn create_test_notes_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test markdown file with content
pub fn create_test_file(notes_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = notes_dir.path().join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A page with the given top-level blocks and no properties
pub fn create_test_page(id: &str, blocks: Vec<Block>) -> PageData {
    PageData {
        id: PageId::new(id),
        title: id.to_string(),
        properties: Default::default(),
        blocks,
        backlinks: Vec::new(),
    }
}
