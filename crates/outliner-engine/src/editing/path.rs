use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::delta::PathShift;

/// Positional address of a block: sibling indices from the page root down.
///
/// A path is only meaningful against the tree snapshot it was taken from.
/// After a structural edit it has to be looked up again or passed through
/// [`BlockPath::rebase`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPath(Vec<usize>);

impl BlockPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The page root. It names the top-level block list, never a block.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Index among siblings.
    pub fn index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the containing list's owner; the root for top-level blocks.
    pub fn parent(&self) -> Option<BlockPath> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    pub fn child(&self, index: usize) -> BlockPath {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn with_index(&self, index: usize) -> Option<BlockPath> {
        let mut indices = self.0.clone();
        *indices.last_mut()? = index;
        Some(Self(indices))
    }

    pub fn next_sibling(&self) -> Option<BlockPath> {
        self.with_index(self.index()? + 1)
    }

    pub fn previous_sibling(&self) -> Option<BlockPath> {
        self.with_index(self.index()?.checked_sub(1)?)
    }

    /// True when `self` is `ancestor` or lies below it.
    pub fn starts_with(&self, ancestor: &BlockPath) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    /// Replace the `from` prefix of this path with `to`.
    pub fn reparent(&self, from: &BlockPath, to: &BlockPath) -> Option<BlockPath> {
        let rest = self.0.strip_prefix(from.0.as_slice())?;
        let mut indices = to.0.clone();
        indices.extend_from_slice(rest);
        Some(Self(indices))
    }

    /// Map a cached path through the shifts of a delta.
    ///
    /// Shifts list every surviving block whose path changed, so an exact
    /// match is enough. A path with no matching shift did not move.
    pub fn rebase(&self, shifts: &[PathShift]) -> BlockPath {
        shifts
            .iter()
            .find(|shift| shift.from == *self)
            .map(|shift| shift.to.clone())
            .unwrap_or_else(|| self.clone())
    }
}

impl From<Vec<usize>> for BlockPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for BlockPath {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid block path '{0}': expected dot-separated indices like 0.2.1")]
pub struct ParsePathError(String);

impl FromStr for BlockPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParsePathError(s.to_string()));
        }
        s.split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| ParsePathError(s.to_string()))
    }
}
