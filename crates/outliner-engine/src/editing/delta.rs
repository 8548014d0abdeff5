use serde::Serialize;

use super::path::BlockPath;
use crate::models::Block;

/// A surviving block whose path changed as a side effect of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathShift {
    pub from: BlockPath,
    pub to: BlockPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum DeltaAction {
    /// `path` is where the new block now lives.
    Add,
    /// Content of the block at `path` changed.
    Update,
    /// The block that was at `path` is gone, along with its subtree.
    Remove,
    /// The block moved from `from` to `path`, taking its subtree along.
    Move { from: BlockPath },
}

/// One change to a page's tree.
///
/// `shifts` covers every block outside this delta's own subtree that
/// survived with a different path. Consumers that do not cache paths can
/// ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta {
    #[serde(flatten)]
    pub action: DeltaAction,
    pub path: BlockPath,
    pub block: Block,
    pub shifts: Vec<PathShift>,
}

impl Delta {
    pub fn add(path: BlockPath, block: Block, shifts: Vec<PathShift>) -> Self {
        Self {
            action: DeltaAction::Add,
            path,
            block,
            shifts,
        }
    }

    pub fn update(path: BlockPath, block: Block) -> Self {
        Self {
            action: DeltaAction::Update,
            path,
            block,
            shifts: Vec::new(),
        }
    }

    pub fn remove(path: BlockPath, block: Block, shifts: Vec<PathShift>) -> Self {
        Self {
            action: DeltaAction::Remove,
            path,
            block,
            shifts,
        }
    }

    pub fn moved(from: BlockPath, to: BlockPath, block: Block, shifts: Vec<PathShift>) -> Self {
        Self {
            action: DeltaAction::Move { from },
            path: to,
            block,
            shifts,
        }
    }

    /// Where a path cached before this delta points afterwards.
    ///
    /// `None` when the delta removed the block it named.
    pub fn rebase(&self, cached: &BlockPath) -> Option<BlockPath> {
        match &self.action {
            DeltaAction::Remove if cached == &self.path => None,
            DeltaAction::Remove if cached.starts_with(&self.path) => {
                // Surviving children of a removed block show up as shifts.
                self.shifts
                    .iter()
                    .find(|shift| shift.from == *cached)
                    .map(|shift| shift.to.clone())
            }
            DeltaAction::Move { from } if cached.starts_with(from) => {
                cached.reparent(from, &self.path)
            }
            _ => Some(cached.rebase(&self.shifts)),
        }
    }
}
