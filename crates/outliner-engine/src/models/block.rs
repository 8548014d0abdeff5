use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parsing::{BlockMarker, CheckboxState, ParsedBlock, Priority, Segment, TodoState, parse_block};

/// Stable identifier of a block, unique within a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id for a newly created block.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The same id every time it is asked for the block at `position` on
    /// `page`, for stores that have nowhere to keep ids.
    pub fn derived(page: &str, position: &[usize]) -> Self {
        let position: Vec<String> = position.iter().map(usize::to_string).collect();
        let name = format!("{page}#{}", position.join("."));
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One outline node: raw content, what was parsed from it, and its children.
///
/// Segments and task metadata are derived from `content` and only change via
/// [`Block::set_content`]. `depth` is kept equal to the nesting level by the
/// tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    id: BlockId,
    content: String,
    #[serde(flatten)]
    parsed: ParsedBlock,
    depth: usize,
    children: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            parsed: parse_block(&content),
            content,
            depth: 0,
            children: Vec::new(),
        }
    }

    /// A new block with a generated id.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self::new(BlockId::generate(), content)
    }

    /// Attach children, fixing up their depths.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        let depth = self.depth;
        self.set_depth(depth);
        self
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.parsed = parse_block(&self.content);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.parsed.segments
    }

    pub fn marker(&self) -> &BlockMarker {
        &self.parsed.marker
    }

    pub fn todo_state(&self) -> Option<TodoState> {
        self.parsed.marker.todo_state
    }

    pub fn checkbox_state(&self) -> Option<CheckboxState> {
        self.parsed.marker.checkbox_state
    }

    pub fn priority(&self) -> Option<Priority> {
        self.parsed.marker.priority
    }

    pub fn is_task(&self) -> bool {
        self.parsed.marker.is_task()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Content length in characters, the unit used for caret offsets.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Distinct pages linked from this block, in order of first appearance.
    pub fn page_references(&self) -> Vec<&str> {
        let mut pages: Vec<&str> = Vec::new();
        for page in self.segments().iter().filter_map(Segment::page_reference) {
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        pages
    }

    /// This block followed by its descendants, depth-first.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        std::iter::once(self).chain(Blocks::new(&self.children))
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Block> {
        &mut self.children
    }

    /// Set this block's depth and renumber the whole subtree below it.
    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth(depth + 1);
        }
    }
}

/// Depth-first iterator over a list of sibling blocks and their subtrees.
pub struct Blocks<'a> {
    stack: Vec<std::slice::Iter<'a, Block>>,
}

impl<'a> Blocks<'a> {
    pub fn new(roots: &'a [Block]) -> Self {
        Self {
            stack: vec![roots.iter()],
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(block) => {
                    self.stack.push(block.children.iter());
                    return Some(block);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
