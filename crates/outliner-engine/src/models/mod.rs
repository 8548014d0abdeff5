pub mod block;
pub mod page;

pub use block::{Block, BlockId, Blocks};
pub use page::{Backlink, PageData, PageId};
