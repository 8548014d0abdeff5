//! Structural editing of a page's outline.
//!
//! Blocks are addressed by [`BlockPath`]s into the current snapshot of a
//! [`BlockTree`]. Every mutation hands back a [`Patch`] (or a single
//! [`Delta`]) describing what changed, including the paths of untouched
//! blocks that were renumbered along the way.

pub mod delta;
pub mod index;
pub mod patch;
pub mod path;
pub mod tree;

pub use delta::{Delta, DeltaAction, PathShift};
pub use index::PathIndex;
pub use patch::{Focus, Patch};
pub use path::{BlockPath, ParsePathError};
pub use tree::BlockTree;
