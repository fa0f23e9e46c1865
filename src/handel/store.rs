use crate::bitset::BitSet;
use crate::candidate_tree::CandidateTree;
use crate::multi_signature::MultiSignature;
use crate::scheme::Signature;

/// Best verified multi-signature known for each level.
///
/// Slot `l` holds the aggregate of level `l`'s candidate range; the node's
/// own contribution is kept apart. A slot only ever moves to a strictly
/// better aggregate.
#[derive(Debug, Clone)]
pub(crate) struct LevelStore<S> {
    own: MultiSignature<S>,
    best: Vec<Option<MultiSignature<S>>>,
    range_sizes: Vec<usize>,
    tree: CandidateTree,
}

impl<S: Signature> LevelStore<S> {
    pub(crate) fn new(tree: CandidateTree, own: S) -> Self {
        let max_level = tree.max_level();
        let range_sizes = (0..=max_level)
            .map(|level| tree.range_size(level).unwrap_or(0))
            .collect();
        Self {
            own: MultiSignature::single(own),
            best: vec![None; max_level + 1],
            range_sizes,
            tree,
        }
    }

    pub(crate) fn best(&self, level: usize) -> Option<&MultiSignature<S>> {
        self.best.get(level).and_then(Option::as_ref)
    }

    /// Whether nothing more can be learnt at `level`.
    pub(crate) fn is_complete(&self, level: usize) -> bool {
        match self.range_sizes.get(level) {
            Some(0) => true,
            Some(_) => self.best(level).is_some_and(|ms| ms.bitset.is_full()),
            None => false,
        }
    }

    /// Whether storing `ms` at `level` would improve the level.
    pub(crate) fn improves(&self, level: usize, ms: &MultiSignature<S>) -> bool {
        match self.best(level) {
            None => true,
            Some(best) if best.bitset.is_superset_of(&ms.bitset) => false,
            Some(best) if !best.bitset.intersects(&ms.bitset) => true,
            Some(best) => ms.cardinality() > best.cardinality(),
        }
    }

    /// Store a verified multi-signature, merging it with the current best
    /// when both are disjoint. Returns whether the level improved.
    pub(crate) fn insert(&mut self, level: usize, ms: MultiSignature<S>) -> bool {
        if level == 0 || level >= self.best.len() || !self.improves(level, &ms) {
            return false;
        }
        let improved = match self.best(level) {
            Some(best) => best.merge(&ms).unwrap_or(ms),
            None => ms,
        };
        self.best[level] = Some(improved);
        true
    }

    /// Multi-signature this node sends at `level`: its own contribution with
    /// the best aggregates of every lower level, laid out over its block at
    /// `level`. At `max_level + 1` this is the aggregate over all nodes.
    pub(crate) fn outgoing(&self, level: usize) -> MultiSignature<S> {
        let mut acc = self.own.clone();
        for lower in 1..level.min(self.best.len()) {
            let size = self.range_sizes[lower];
            let lower_half = self.tree.is_lower_half(lower);
            acc = match self.best(lower) {
                Some(other) if lower_half => acc.combine(other),
                Some(other) => other.combine(&acc),
                None if lower_half => MultiSignature::new(
                    acc.signature,
                    acc.bitset.combine(&BitSet::new(size)),
                ),
                None => MultiSignature::new(
                    acc.signature,
                    BitSet::new(size).combine(&acc.bitset),
                ),
            };
        }
        acc
    }

    /// Aggregate over all nodes known so far.
    pub(crate) fn global(&self) -> MultiSignature<S> {
        self.outgoing(self.tree.max_level() + 1)
    }
}
