use ochrance_oracle::{combine, Digest, HashAlgorithm};
use rayon::prelude::*;

use crate::proof::{MerkleProof, ProofStep, Side};
use crate::{NODE_DOMAIN_TAG, PARALLEL_THRESHOLD};

/// The recursive Leaf/Node view of a Merkle tree. Built on demand from a
/// [`MerkleTree`]'s cached levels — the tree itself stores
/// a flat level cache internally so construction and proof extraction stay
/// `O(n)`/`O(log n)` without paying for boxed-duplicate subtrees on every
/// odd level.
#[derive(Debug, Clone)]
pub enum MerkleNode {
    Leaf(Digest),
    Node {
        digest: Digest,
        left: Box<MerkleNode>,
        right: Box<MerkleNode>,
    },
}

impl MerkleNode {
    #[must_use]
    pub fn digest(&self) -> &Digest {
        match self {
            Self::Leaf(d) => d,
            Self::Node { digest, .. } => digest,
        }
    }
}

/// A binary Merkle tree built over `n` leaf digests.
///
/// Internally represented as a level cache (`levels[0]` = leaves,
/// `levels.last()` = `[root]`) rather than a pointer tree, so that proof
/// generation is a simple level-indexed walk. [`MerkleTree::to_node_tree`]
/// reconstructs the algebraic Leaf/Node view when callers need it.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    algorithm: HashAlgorithm,
    leaf_count: usize,
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`. Empty input yields a tree whose root is
    /// the algorithm's well-known zero digest (the sentinel empty-root);
    /// construction is `O(n)` time and memory.
    #[must_use]
    pub fn build(algorithm: HashAlgorithm, leaves: &[Digest]) -> Self {
        if leaves.is_empty() {
            return Self {
                algorithm,
                leaf_count: 0,
                levels: vec![vec![Digest::zero(algorithm)]],
            };
        }

        let mut levels: Vec<Vec<Digest>> = Vec::new();
        levels.push(leaves.to_vec());

        let mut current = leaves.to_vec();
        while current.len() > 1 {
            let next = combine_level(algorithm, &current);
            levels.push(next.clone());
            current = next;
        }

        Self {
            algorithm,
            leaf_count: leaves.len(),
            levels,
        }
    }

    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Depth of the tree (number of combine levels above the leaves). Zero
    /// for the empty and singleton cases.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    #[must_use]
    pub fn root_digest(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_else(|| Digest::zero(self.algorithm))
    }

    /// Generate an inclusion proof for leaf `index`. Returns `None` if
    /// `index >= leaf_count()` (including the empty tree, for which no leaf
    /// index is ever valid). `O(log n)`.
    #[must_use]
    pub fn prove(&self, index: usize) -> Option<MerkleProof> {
        if self.leaf_count == 0 || index >= self.leaf_count {
            return None;
        }

        let leaf_digest = self.levels[0][index].clone();
        let mut path = Vec::with_capacity(self.depth());
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_last_unpaired = idx == level.len() - 1 && level.len() % 2 == 1;
            if is_last_unpaired {
                path.push(ProofStep {
                    side: Side::Right,
                    sibling: level[idx].clone(),
                });
            } else if idx % 2 == 0 {
                path.push(ProofStep {
                    side: Side::Right,
                    sibling: level[idx + 1].clone(),
                });
            } else {
                path.push(ProofStep {
                    side: Side::Left,
                    sibling: level[idx - 1].clone(),
                });
            }
            idx /= 2;
        }

        Some(MerkleProof {
            leaf_digest,
            path,
            algorithm: self.algorithm,
        })
    }

    /// Reconstruct the algebraic [`MerkleNode`] view of the tree. Rebuilt on
    /// demand rather than stored, since most callers only need
    /// [`Self::root_digest`] or [`Self::prove`].
    #[must_use]
    pub fn to_node_tree(&self) -> MerkleNode {
        let mut current: Vec<MerkleNode> = self.levels[0]
            .iter()
            .cloned()
            .map(MerkleNode::Leaf)
            .collect();

        for level_idx in 1..self.levels.len() {
            let mut next = Vec::with_capacity(self.levels[level_idx].len());
            let mut i = 0;
            let mut out = 0;
            while i < current.len() {
                if i + 1 < current.len() {
                    next.push(MerkleNode::Node {
                        digest: self.levels[level_idx][out].clone(),
                        left: Box::new(current[i].clone()),
                        right: Box::new(current[i + 1].clone()),
                    });
                    i += 2;
                } else {
                    next.push(MerkleNode::Node {
                        digest: self.levels[level_idx][out].clone(),
                        left: Box::new(current[i].clone()),
                        right: Box::new(current[i].clone()),
                    });
                    i += 1;
                }
                out += 1;
            }
            current = next;
        }

        current.into_iter().next().unwrap_or_else(|| {
            MerkleNode::Leaf(Digest::zero(self.algorithm))
        })
    }
}

/// Combine one level of digests into the next, duplicating the trailing
/// element before combining when the level has odd length.
fn combine_level(algorithm: HashAlgorithm, level: &[Digest]) -> Vec<Digest> {
    let pairs = level.len() / 2 + level.len() % 2;
    let build_pair = |i: usize| -> Digest {
        let left = &level[i * 2];
        let right = if i * 2 + 1 < level.len() {
            &level[i * 2 + 1]
        } else {
            left
        };
        combine(algorithm, NODE_DOMAIN_TAG, left, right)
    };

    if level.len() >= PARALLEL_THRESHOLD {
        (0..pairs).into_par_iter().map(build_pair).collect()
    } else {
        (0..pairs).map(build_pair).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ochrance_oracle::oracle;

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n)
            .map(|i| oracle(HashAlgorithm::Sha256, &i.to_le_bytes()))
            .collect()
    }

    #[test]
    fn empty_tree_has_zero_root() {
        let t = MerkleTree::build(HashAlgorithm::Sha256, &[]);
        assert_eq!(t.root_digest(), Digest::zero(HashAlgorithm::Sha256));
        assert_eq!(t.leaf_count(), 0);
        assert!(t.prove(0).is_none());
    }

    #[test]
    fn singleton_tree_root_is_the_leaf() {
        let ls = leaves(1);
        let t = MerkleTree::build(HashAlgorithm::Sha256, &ls);
        assert_eq!(t.root_digest(), ls[0]);
    }

    #[test]
    fn construction_is_deterministic() {
        let ls = leaves(7);
        let a = MerkleTree::build(HashAlgorithm::Sha256, &ls);
        let b = MerkleTree::build(HashAlgorithm::Sha256, &ls);
        assert_eq!(a.root_digest(), b.root_digest());
    }

    #[test]
    fn odd_counts_duplicate_trailing_element() {
        let ls = leaves(3);
        let t = MerkleTree::build(HashAlgorithm::Sha256, &ls);
        let expected_level1_0 = combine(HashAlgorithm::Sha256, NODE_DOMAIN_TAG, &ls[0], &ls[1]);
        let expected_level1_1 = combine(HashAlgorithm::Sha256, NODE_DOMAIN_TAG, &ls[2], &ls[2]);
        let expected_root = combine(
            HashAlgorithm::Sha256,
            NODE_DOMAIN_TAG,
            &expected_level1_0,
            &expected_level1_1,
        );
        assert_eq!(t.root_digest(), expected_root);
    }

    #[test]
    fn every_leaf_proves_against_the_root() {
        for n in [1, 2, 3, 4, 5, 8, 13, 16, 33] {
            let ls = leaves(n);
            let t = MerkleTree::build(HashAlgorithm::Sha256, &ls);
            let root = t.root_digest();
            for i in 0..n {
                let proof = t.prove(i).unwrap();
                assert!(proof.verify(&root).is_ok(), "leaf {i} of {n} failed");
            }
        }
    }

    #[test]
    fn to_node_tree_root_matches_root_digest() {
        let ls = leaves(5);
        let t = MerkleTree::build(HashAlgorithm::Sha256, &ls);
        let node = t.to_node_tree();
        assert_eq!(node.digest(), &t.root_digest());
    }
}
