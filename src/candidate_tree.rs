//! Binary partition of the participant index space around one node.
//!
//! All indices are the leaves of a balanced binary tree. At level `l` the
//! candidates of a node are the leaves of the sibling subtree met `l` steps
//! up from the node's own leaf: `[min, min + 2^(l-1))`, clamped to the
//! registry size. Ranges of different levels are disjoint and, together with
//! the node itself, cover every index exactly once.
use blake2::{Blake2b, Digest};
use digest::consts::U8;

use crate::error::TreeError;

/// `ceil(log2(size))`, the number of levels of a registry of `size` nodes.
pub fn log2(size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    (usize::BITS - (size - 1).leading_zeros()) as usize
}

/// Level ranges of a given node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateTree {
    id: usize,
    size: usize,
    max_level: usize,
}

impl CandidateTree {
    pub fn new(id: usize, size: usize) -> Self {
        Self {
            id,
            size,
            max_level: log2(size),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Highest valid level. Levels are numbered from 1.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Candidate range `[min, max)` of the given level.
    ///
    /// # Error
    /// Fails when the level is not in `1..=max_level`, or when the sibling
    /// subtree lies entirely past the end of the registry.
    pub fn range_at(&self, level: usize) -> Result<(usize, usize), TreeError> {
        if level == 0 || level > self.max_level {
            return Err(TreeError::LevelOutOfRange {
                level,
                max: self.max_level,
            });
        }
        let shift = level - 1;
        let min = ((self.id >> shift) ^ 1) << shift;
        if min >= self.size {
            return Err(TreeError::EmptyLevel(level));
        }
        Ok((min, (min + (1 << shift)).min(self.size)))
    }

    /// Size of the candidate range at `level`, zero for empty levels.
    pub fn range_size(&self, level: usize) -> Result<usize, TreeError> {
        match self.range_at(level) {
            Ok((min, max)) => Ok(max - min),
            Err(TreeError::EmptyLevel(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Subtree `[start, end)` holding this node whose contributions are sent
    /// at `level`. It is the candidate range of `level` as seen from every
    /// node of that range. At `max_level + 1` it spans the whole registry.
    pub fn block_at(&self, level: usize) -> (usize, usize) {
        let shift = level.saturating_sub(1).min(usize::BITS as usize - 1);
        let start = (self.id >> shift) << shift;
        (start, start.saturating_add(1 << shift).min(self.size))
    }

    /// Whether this node's block sits in the lower half of its parent block at
    /// the given level.
    pub(crate) fn is_lower_half(&self, level: usize) -> bool {
        (self.id >> level.saturating_sub(1)) & 1 == 0
    }

    /// Candidates of `level` in the order this node contacts them.
    ///
    /// The order is a deterministic per-node shuffle so that the peers of a
    /// range are not all contacted first by the same nodes.
    pub fn candidates_at(&self, level: usize) -> Result<Vec<usize>, TreeError> {
        let (min, max) = self.range_at(level)?;
        let mut candidates: Vec<(u64, usize)> = (min..max)
            .map(|peer| (self.rank(peer), peer))
            .collect();
        candidates.sort_unstable();
        Ok(candidates.into_iter().map(|(_, peer)| peer).collect())
    }

    fn rank(&self, peer: usize) -> u64 {
        let mut hasher = Blake2b::<U8>::new();
        hasher.update((self.id as u64).to_be_bytes());
        hasher.update((peer as u64).to_be_bytes());
        let mut rank = [0u8; 8];
        rank.copy_from_slice(&hasher.finalize());
        u64::from_be_bytes(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_log2() {
        assert_eq!(log2(0), 0);
        assert_eq!(log2(1), 0);
        assert_eq!(log2(2), 1);
        assert_eq!(log2(3), 2);
        assert_eq!(log2(4), 2);
        assert_eq!(log2(5), 3);
        assert_eq!(log2(8), 3);
        assert_eq!(log2(9), 4);
        assert_eq!(log2(65535), 16);
    }

    #[test]
    fn test_ranges_power_of_two() {
        let tree = CandidateTree::new(0, 8);
        assert_eq!(tree.max_level(), 3);
        assert_eq!(tree.range_at(1), Ok((1, 2)));
        assert_eq!(tree.range_at(2), Ok((2, 4)));
        assert_eq!(tree.range_at(3), Ok((4, 8)));

        let tree = CandidateTree::new(5, 8);
        assert_eq!(tree.range_at(1), Ok((4, 5)));
        assert_eq!(tree.range_at(2), Ok((6, 8)));
        assert_eq!(tree.range_at(3), Ok((0, 4)));
    }

    #[test]
    fn test_invalid_levels() {
        let tree = CandidateTree::new(0, 8);
        assert_eq!(
            tree.range_at(0),
            Err(TreeError::LevelOutOfRange { level: 0, max: 3 })
        );
        assert_eq!(
            tree.range_at(4),
            Err(TreeError::LevelOutOfRange { level: 4, max: 3 })
        );
        assert!(CandidateTree::new(0, 1).range_at(1).is_err());
    }

    #[test]
    fn test_clamped_and_empty_levels() {
        let tree = CandidateTree::new(0, 5);
        assert_eq!(tree.range_at(3), Ok((4, 5)));

        let tree = CandidateTree::new(4, 5);
        assert_eq!(tree.range_at(1), Err(TreeError::EmptyLevel(1)));
        assert_eq!(tree.range_at(2), Err(TreeError::EmptyLevel(2)));
        assert_eq!(tree.range_at(3), Ok((0, 4)));
        assert_eq!(tree.range_size(1), Ok(0));
        assert_eq!(tree.block_at(3), (4, 5));
        assert_eq!(tree.block_at(4), (0, 5));
    }

    #[test]
    fn test_blocks_match_peer_ranges() {
        let n = 11;
        for id in 0..n {
            let tree = CandidateTree::new(id, n);
            for level in 1..=tree.max_level() {
                if let Ok((min, max)) = tree.range_at(level) {
                    for peer in min..max {
                        let peer_tree = CandidateTree::new(peer, n);
                        assert_eq!(peer_tree.block_at(level), (min, max));
                    }
                }
            }
        }
    }

    #[test]
    fn test_candidates_order() {
        let tree = CandidateTree::new(3, 16);
        let mut candidates = tree.candidates_at(4).unwrap();
        assert_eq!(candidates, tree.candidates_at(4).unwrap());
        candidates.sort_unstable();
        assert_eq!(candidates, (8..16).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_partition(n in 1..300usize, seed in any::<usize>()) {
            let id = seed % n;
            let tree = CandidateTree::new(id, n);
            let mut seen = vec![0u32; n];
            seen[id] += 1;
            for level in 1..=tree.max_level() {
                if let Ok((min, max)) = tree.range_at(level) {
                    prop_assert!(min < max && max <= n);
                    prop_assert!(max - min <= 1 << (level - 1));
                    prop_assert!(!(min..max).contains(&id));
                    for i in min..max {
                        seen[i] += 1;
                    }
                }
            }
            prop_assert!(seen.iter().all(|&c| c == 1));
        }
    }
}
