//! Page persistence.
//!
//! The outline core talks to durable storage only through [`PageStore`].
//! Two adapters ship with the crate: [`MemoryPageStore`] for tests and
//! embedding, and [`FilePageStore`] which keeps one markdown file per page.

pub mod backlinks;
pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::editing::{BlockPath, Delta};
use crate::io::IoError;
use crate::models::{Block, BlockId, PageData, PageId};

pub use backlinks::BacklinkIndex;
pub use file::FilePageStore;
pub use memory::MemoryPageStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No block at {path} on page {page}")]
    InvalidPath { page: PageId, path: BlockPath },
    #[error("Block {block} is no longer on page {page}")]
    MissingBlock { page: PageId, block: BlockId },
    #[error("Page store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] IoError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of pages, blocks and backlinks.
///
/// Fetching a page that does not exist yet creates it with one empty block.
/// Paths are interpreted against the store's own copy of the page.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn fetch_page(&self, page: &PageId) -> StoreResult<PageData>;

    /// Replace a block's content.
    async fn commit_update(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta>;

    /// Insert a new block; the store picks its id.
    async fn commit_insert(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta>;

    /// Replace the whole block list of a page, for structural edits.
    async fn commit_blocks(&self, page: &PageId, blocks: Vec<Block>) -> StoreResult<()>;

    async fn list_pages(&self) -> StoreResult<Vec<PageId>>;
}

fn lock_poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}
