//! # Inline Parsing
//!
//! Cursor-based inline parsing of a single block's content into typed
//! [`Segment`]s.
//!
//! ## Modules
//!
//! - **`types`**: `Segment`, `SegmentKind`, `LinkKind`, `ImageKind`
//! - **`kinds`**: delimiter constants owned by each inline construct
//! - **`cursor`**: `Cursor` for byte-wise scanning with position tracking
//! - **`parser`**: `parse_inline()` main entry point with `try_parse_*` productions
//!
//! ## Precedence
//!
//! The earliest-starting construct wins: `**see [[Page]]**` is one bold
//! segment, not bold text containing a link. Between constructs that start at
//! the same byte, the production order in `parser` decides.

pub mod cursor;
pub mod kinds;
pub mod parser;
pub mod types;

pub use parser::parse_inline;
pub use types::{ImageKind, LinkKind, Segment, SegmentKind};
