use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Block, BlockId};

/// Page name as used in `[[links]]` and in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PageId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A block on another page that links here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backlink {
    pub source_page: PageId,
    pub block_id: BlockId,
    pub content: String,
}

/// A whole page as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageData {
    pub id: PageId,
    pub title: String,
    pub properties: BTreeMap<String, String>,
    pub blocks: Vec<Block>,
    pub backlinks: Vec<Backlink>,
}

impl PageData {
    /// A fresh page holding one empty block, so there is always something to edit.
    pub fn empty(id: PageId) -> Self {
        Self {
            title: id.to_string(),
            id,
            properties: BTreeMap::new(),
            blocks: vec![Block::with_content("")],
            backlinks: Vec::new(),
        }
    }
}
