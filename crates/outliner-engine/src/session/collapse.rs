use super::flags::{FlagStore, FlagStoreError, MemoryFlagStore};
use crate::models::{Block, BlockId, PageId};

/// Which blocks are folded, per page. Never part of page content.
pub struct CollapseState {
    flags: Box<dyn FlagStore>,
}

impl Default for CollapseState {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for CollapseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapseState").finish_non_exhaustive()
    }
}

impl CollapseState {
    pub fn new(flags: Box<dyn FlagStore>) -> Self {
        Self { flags }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryFlagStore::new()))
    }

    pub fn is_collapsed(&self, page: &PageId, block: &BlockId) -> bool {
        self.flags.contains(&key(page, block))
    }

    pub fn set_collapsed(
        &mut self,
        page: &PageId,
        block: &BlockId,
        collapsed: bool,
    ) -> Result<(), FlagStoreError> {
        self.flags.set(&key(page, block), collapsed)
    }

    /// Flip one block; returns the new state.
    pub fn toggle(&mut self, page: &PageId, block: &BlockId) -> Result<bool, FlagStoreError> {
        let collapsed = !self.is_collapsed(page, block);
        self.set_collapsed(page, block, collapsed)?;
        Ok(collapsed)
    }

    /// Set the same state on a block and every block below it.
    pub fn toggle_recursive(
        &mut self,
        page: &PageId,
        block: &Block,
        collapse: bool,
    ) -> Result<(), FlagStoreError> {
        let keys: Vec<String> = block.iter().map(|b| key(page, b.id())).collect();
        self.flags.set_many(&keys, collapse)
    }
}

/// `collapsed:["page","block"]`; the JSON pair keeps separators inside
/// names from running two keys together.
fn key(page: &PageId, block: &BlockId) -> String {
    format!("collapsed:{}", serde_json::json!([page.as_str(), block.as_str()]))
}
