//! Block content parsing.
//!
//! A block's raw content is split into block-level metadata (task keyword,
//! priority, checkbox) and inline segments. Both are pure functions of the
//! content string.

pub mod inline;
pub mod marker;

use serde::Serialize;

pub use inline::{ImageKind, LinkKind, Segment, SegmentKind, parse_inline};
pub use marker::{BlockMarker, CheckboxState, Priority, TodoState, parse_marker};

/// Everything derived from a block's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedBlock {
    #[serde(flatten)]
    pub marker: BlockMarker,
    pub segments: Vec<Segment>,
}

/// Parse a block's content. The marker prefix is not part of the segments.
pub fn parse_block(content: &str) -> ParsedBlock {
    let (marker, body) = parse_marker(content);
    ParsedBlock {
        marker,
        segments: parse_inline(body),
    }
}
