pub mod editing;
pub mod io;
pub mod models;
pub mod parsing;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{BlockPath, BlockTree, Delta, DeltaAction, Focus, Patch, PathShift};
pub use models::{Backlink, Block, BlockId, PageData, PageId};
pub use parsing::{BlockMarker, ParsedBlock, Segment, TodoState, parse_block};
pub use session::{CollapseState, NavPhase, Session, SessionError};
pub use store::{FilePageStore, MemoryPageStore, PageStore, StoreError};
