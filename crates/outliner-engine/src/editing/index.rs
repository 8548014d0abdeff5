use std::collections::{HashMap, HashSet};

use super::delta::PathShift;
use super::path::BlockPath;
use crate::models::{Block, BlockId};

/// Lookup from block id to its current path.
///
/// Rebuilt from scratch after every structural mutation; blocks never hold
/// references to their parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathIndex {
    paths: HashMap<BlockId, BlockPath>,
}

impl PathIndex {
    pub fn build(blocks: &[Block]) -> Self {
        let mut paths = HashMap::new();
        let mut stack: Vec<(BlockPath, &[Block])> = vec![(BlockPath::root(), blocks)];
        while let Some((parent, siblings)) = stack.pop() {
            for (i, block) in siblings.iter().enumerate() {
                let path = parent.child(i);
                if block.has_children() {
                    stack.push((path.clone(), block.children()));
                }
                paths.insert(block.id().clone(), path);
            }
        }
        Self { paths }
    }

    pub fn get(&self, id: &BlockId) -> Option<&BlockPath> {
        self.paths.get(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.paths.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths that changed between `self` (before) and `after`, skipping
    /// blocks that only exist on one side and the ids in `skip`.
    ///
    /// Sorted by the old path so the output is deterministic.
    pub fn shifts_to(&self, after: &PathIndex, skip: &HashSet<BlockId>) -> Vec<PathShift> {
        let mut shifts: Vec<PathShift> = self
            .paths
            .iter()
            .filter(|(id, _)| !skip.contains(*id))
            .filter_map(|(id, from)| {
                let to = after.paths.get(id)?;
                (to != from).then(|| PathShift {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect();
        shifts.sort_by(|a, b| a.from.cmp(&b.from));
        shifts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outline() -> Vec<Block> {
        vec![
            Block::new("a", "A").with_children(vec![Block::new("b", "B"), Block::new("c", "C")]),
            Block::new("d", "D"),
        ]
    }

    #[test]
    fn test_build_indexes_every_block() {
        let index = PathIndex::build(&outline());
        assert_eq!(index.len(), 4);
        assert_eq!(index.get(&"a".into()), Some(&BlockPath::new(vec![0])));
        assert_eq!(index.get(&"c".into()), Some(&BlockPath::new(vec![0, 1])));
        assert_eq!(index.get(&"d".into()), Some(&BlockPath::new(vec![1])));
        assert_eq!(index.get(&"zz".into()), None);
    }

    #[test]
    fn test_shifts_include_descendants_of_moved_siblings() {
        let before = PathIndex::build(&outline());
        let mut blocks = outline();
        blocks.insert(0, Block::new("new", "N"));
        let after = PathIndex::build(&blocks);

        let shifts = before.shifts_to(&after, &HashSet::new());

        assert_eq!(
            shifts,
            vec![
                PathShift { from: BlockPath::new(vec![0]), to: BlockPath::new(vec![1]) },
                PathShift { from: BlockPath::new(vec![0, 0]), to: BlockPath::new(vec![1, 0]) },
                PathShift { from: BlockPath::new(vec![0, 1]), to: BlockPath::new(vec![1, 1]) },
                PathShift { from: BlockPath::new(vec![1]), to: BlockPath::new(vec![2]) },
            ]
        );
    }

    #[test]
    fn test_skip_set_is_respected() {
        let before = PathIndex::build(&outline());
        let mut blocks = outline();
        blocks.swap(0, 1);
        let after = PathIndex::build(&blocks);
        let skip: HashSet<BlockId> = ["a", "b", "c"].into_iter().map(BlockId::from).collect();

        let shifts = before.shifts_to(&after, &skip);

        assert_eq!(
            shifts,
            vec![PathShift { from: BlockPath::new(vec![1]), to: BlockPath::new(vec![0]) }]
        );
    }
}
