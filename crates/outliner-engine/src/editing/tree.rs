use std::collections::HashSet;

use log::debug;

use super::delta::{Delta, DeltaAction};
use super::index::PathIndex;
use super::patch::{Focus, Patch};
use super::path::BlockPath;
use crate::models::{Block, BlockId, Blocks};
use crate::parsing::TodoState;

/// A page's outline: owned nested blocks plus an id to path index.
///
/// Mutations take a path into the current snapshot. A path that does not
/// resolve, or an edit that makes no sense at that position, returns `None`
/// and leaves the tree untouched; callers treat that as a cue to reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTree {
    blocks: Vec<Block>,
    index: PathIndex,
    version: u64,
}

impl BlockTree {
    pub fn new(mut blocks: Vec<Block>) -> Self {
        for block in &mut blocks {
            block.set_depth(0);
        }
        let index = PathIndex::build(&blocks);
        Self {
            blocks,
            index,
            version: 0,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Bumped by every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of blocks at every depth.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every block, depth-first in document order.
    pub fn iter(&self) -> Blocks<'_> {
        Blocks::new(&self.blocks)
    }

    /// Blocks carrying a TODO keyword or a checkbox.
    pub fn task_blocks(&self) -> Vec<&Block> {
        self.iter().filter(|block| block.is_task()).collect()
    }

    pub fn blocks_with_state(&self, state: TodoState) -> Vec<&Block> {
        self.iter()
            .filter(|block| block.todo_state() == Some(state))
            .collect()
    }

    pub fn resolve(&self, path: &BlockPath) -> Option<&Block> {
        let index = path.index()?;
        self.siblings(&path.parent()?)?.get(index)
    }

    pub fn locate(&self, id: &BlockId) -> Option<&BlockPath> {
        self.index.get(id)
    }

    pub fn find(&self, id: &BlockId) -> Option<&Block> {
        self.resolve(self.locate(id)?)
    }

    /// Insert a new block with fresh id at `path`; later siblings move down.
    pub fn insert_at(&mut self, path: &BlockPath, content: &str) -> Option<Delta> {
        self.insert_block(path, Block::with_content(content))
    }

    /// Insert an existing block (and its subtree) at `path`.
    pub fn insert_block(&mut self, path: &BlockPath, mut block: Block) -> Option<Delta> {
        let parent = path.parent()?;
        let index = path.index()?;
        if self.index.contains(block.id()) {
            return None;
        }
        let before = self.index.clone();
        let siblings = self.siblings_mut(&parent)?;
        if index > siblings.len() {
            return None;
        }
        block.set_depth(parent.len());
        siblings.insert(index, block.clone());
        self.reindex();

        debug!("Inserted block {} at {}", block.id(), path);
        let shifts = before.shifts_to(&self.index, &HashSet::new());
        Some(Delta::add(path.clone(), block, shifts))
    }

    pub fn update_content(&mut self, path: &BlockPath, content: &str) -> Option<Delta> {
        let block = self.resolve_mut(path)?;
        block.set_content(content);
        let block = block.clone();
        self.version += 1;

        debug!("Updated block {} at {}", block.id(), path);
        Some(Delta::update(path.clone(), block))
    }

    /// Split the block at `path` at a character offset.
    ///
    /// The block keeps the text before the caret. The text after it goes to
    /// a new block that becomes the first child when the block already has
    /// children and the tail is non-empty, and the next sibling otherwise.
    pub fn split(&mut self, path: &BlockPath, offset: usize) -> Option<Patch> {
        let block = self.resolve(path)?;
        let at = char_to_byte(block.content(), offset)?;
        let (head, tail) = block.content().split_at(at);
        let (head, tail) = (head.to_string(), tail.to_string());

        let new_path = if block.has_children() && !tail.is_empty() {
            path.child(0)
        } else {
            path.next_sibling()?
        };
        let new_parent = new_path.parent()?;
        let new_index = new_path.index()?;

        let before = self.index.clone();
        self.resolve_mut(path)?.set_content(head);
        let mut new_block = Block::with_content(tail);
        new_block.set_depth(new_parent.len());
        self.siblings_mut(&new_parent)?
            .insert(new_index, new_block.clone());
        self.reindex();

        debug!("Split block at {} offset {}, new block at {}", path, offset, new_path);
        let shifts = before.shifts_to(&self.index, &HashSet::new());
        let updated = self.resolve(path)?.clone();
        Some(Patch {
            deltas: vec![
                Delta::update(path.clone(), updated),
                Delta::add(new_path.clone(), new_block, shifts),
            ],
            focus: Some(Focus::at(new_path, 0)),
            version: self.version,
        })
    }

    /// Merge the block at `path` into the block before it in document order.
    ///
    /// The caret lands where the two contents meet. Children of the merged
    /// block keep their document order: appended to the target's children,
    /// or put in the merged block's place when the target is its parent.
    pub fn merge(&mut self, path: &BlockPath) -> Option<Patch> {
        let merged = self.resolve(path)?.clone();
        let target_path = self.merge_target(path)?;
        let into_parent = path.previous_sibling().is_none();
        let parent = path.parent()?;
        let index = path.index()?;

        let before = self.index.clone();
        let siblings = self.siblings_mut(&parent)?;
        let mut removed = siblings.remove(index);
        let mut orphans = std::mem::take(removed.children_mut());
        if into_parent {
            for orphan in &mut orphans {
                orphan.set_depth(parent.len());
            }
            siblings.splice(index..index, orphans);
        } else {
            let target = self.resolve_mut(&target_path)?;
            let depth = target.depth() + 1;
            for mut orphan in orphans {
                orphan.set_depth(depth);
                target.children_mut().push(orphan);
            }
        }

        let target = self.resolve_mut(&target_path)?;
        let caret = target.char_len();
        let joined = format!("{}{}", target.content(), removed.content());
        target.set_content(joined);
        let target = target.clone();
        self.reindex();

        debug!("Merged block at {} into {}", path, target_path);
        let skip = HashSet::from([merged.id().clone()]);
        let shifts = before.shifts_to(&self.index, &skip);
        Some(Patch {
            deltas: vec![
                Delta::remove(path.clone(), merged, shifts),
                Delta::update(target_path.clone(), target),
            ],
            focus: Some(Focus::at(target_path, caret)),
            version: self.version,
        })
    }

    /// Make the block the last child of its previous sibling.
    pub fn indent(&mut self, path: &BlockPath) -> Option<Patch> {
        let new_parent = path.previous_sibling()?;
        let new_index = self.resolve(&new_parent)?.children().len();
        self.resolve(path)?;
        let new_path = new_parent.child(new_index);

        let block = self.detach(path)?;
        self.attach(&new_path, block)?;
        debug!("Indented block at {} to {}", path, new_path);
        self.moved_patch(path, new_path)
    }

    /// Make the block the next sibling of its parent. Following siblings
    /// stay where they are.
    pub fn outdent(&mut self, path: &BlockPath) -> Option<Patch> {
        let parent = path.parent()?;
        if parent.is_root() {
            return None;
        }
        let new_path = parent.next_sibling()?;
        self.resolve(path)?;

        let block = self.detach(path)?;
        self.attach(&new_path, block)?;
        debug!("Outdented block at {} to {}", path, new_path);
        self.moved_patch(path, new_path)
    }

    /// Delete a block and its whole subtree.
    pub fn remove(&mut self, path: &BlockPath) -> Option<Patch> {
        let before = self.index.clone();
        let removed = self.detach(path)?;
        self.reindex();

        debug!("Removed block {} at {}", removed.id(), path);
        let skip: HashSet<BlockId> = removed.iter().map(|b| b.id().clone()).collect();
        let shifts = before.shifts_to(&self.index, &skip);
        Some(Patch {
            deltas: vec![Delta::remove(path.clone(), removed, shifts)],
            focus: None,
            version: self.version,
        })
    }

    /// Replay a delta produced elsewhere, typically by the page store.
    ///
    /// Updates replace content only, keeping local children. Returns false
    /// when the delta does not fit this tree; the caller should reload.
    pub fn apply_delta(&mut self, delta: &Delta) -> bool {
        match &delta.action {
            DeltaAction::Add => self.insert_block(&delta.path, delta.block.clone()).is_some(),
            DeltaAction::Update => {
                if self.resolve(&delta.path).map(Block::id) != Some(delta.block.id()) {
                    return false;
                }
                self.update_content(&delta.path, delta.block.content())
                    .is_some()
            }
            DeltaAction::Remove => {
                if self.resolve(&delta.path).map(Block::id) != Some(delta.block.id()) {
                    return false;
                }
                self.remove(&delta.path).is_some()
            }
            DeltaAction::Move { from } => {
                if self.resolve(from).map(Block::id) != Some(delta.block.id()) {
                    return false;
                }
                let Some(block) = self.detach(from) else {
                    return false;
                };
                if self.attach(&delta.path, block.clone()).is_none() {
                    // Put it back so a failed replay leaves the tree as it was.
                    let _ = self.attach(from, block);
                    return false;
                }
                self.reindex();
                true
            }
        }
    }

    fn merge_target(&self, path: &BlockPath) -> Option<BlockPath> {
        let Some(mut target) = path.previous_sibling() else {
            let parent = path.parent()?;
            return (!parent.is_root()).then_some(parent);
        };
        loop {
            let block = self.resolve(&target)?;
            match block.children().len() {
                0 => return Some(target),
                n => target = target.child(n - 1),
            }
        }
    }

    fn moved_patch(&mut self, from: &BlockPath, to: BlockPath) -> Option<Patch> {
        let before = self.index.clone();
        self.reindex();
        let block = self.resolve(&to)?.clone();
        let skip: HashSet<BlockId> = block.iter().map(|b| b.id().clone()).collect();
        let shifts = before.shifts_to(&self.index, &skip);
        Some(Patch {
            deltas: vec![Delta::moved(from.clone(), to.clone(), block, shifts)],
            focus: Some(Focus::keep(to)),
            version: self.version,
        })
    }

    /// Take a block out of the tree without reindexing.
    fn detach(&mut self, path: &BlockPath) -> Option<Block> {
        let index = path.index()?;
        let siblings = self.siblings_mut(&path.parent()?)?;
        (index < siblings.len()).then(|| siblings.remove(index))
    }

    /// Put a detached block at `path`, fixing depths, without reindexing.
    fn attach(&mut self, path: &BlockPath, mut block: Block) -> Option<()> {
        let parent = path.parent()?;
        let index = path.index()?;
        let siblings = self.siblings_mut(&parent)?;
        if index > siblings.len() {
            return None;
        }
        block.set_depth(parent.len());
        siblings.insert(index, block);
        Some(())
    }

    fn reindex(&mut self) {
        self.index = PathIndex::build(&self.blocks);
        self.version += 1;
    }

    fn siblings(&self, parent: &BlockPath) -> Option<&[Block]> {
        let mut list = self.blocks.as_slice();
        for &i in parent.indices() {
            list = list.get(i)?.children();
        }
        Some(list)
    }

    fn siblings_mut(&mut self, parent: &BlockPath) -> Option<&mut Vec<Block>> {
        let mut list = &mut self.blocks;
        for &i in parent.indices() {
            list = list.get_mut(i)?.children_mut();
        }
        Some(list)
    }

    fn resolve_mut(&mut self, path: &BlockPath) -> Option<&mut Block> {
        let index = path.index()?;
        self.siblings_mut(&path.parent()?)?.get_mut(index)
    }
}

/// Byte position of the `offset`-th character; the end of `s` counts.
fn char_to_byte(s: &str, offset: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(offset)
}
