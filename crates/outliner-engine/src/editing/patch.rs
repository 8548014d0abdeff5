use serde::Serialize;

use super::delta::Delta;
use super::path::BlockPath;

/// Where the caret should go after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Focus {
    pub path: BlockPath,
    /// Character offset in the block's content; `None` keeps the caret
    /// where it was inside the block.
    pub offset: Option<usize>,
}

impl Focus {
    pub fn at(path: BlockPath, offset: usize) -> Self {
        Self {
            path,
            offset: Some(offset),
        }
    }

    pub fn keep(path: BlockPath) -> Self {
        Self { path, offset: None }
    }
}

/// Result of one mutation: its deltas in order, the new caret and the tree
/// version after applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub deltas: Vec<Delta>,
    pub focus: Option<Focus>,
    pub version: u64,
}

impl Patch {
    pub fn single(delta: Delta, focus: Option<Focus>, version: u64) -> Self {
        Self {
            deltas: vec![delta],
            focus,
            version,
        }
    }

    /// Carry a path cached before this patch through all of its deltas.
    pub fn rebase(&self, cached: &BlockPath) -> Option<BlockPath> {
        self.deltas
            .iter()
            .try_fold(cached.clone(), |path, delta| delta.rebase(&path))
    }
}
