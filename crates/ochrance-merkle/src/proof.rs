use ochrance_oracle::{combine, Digest, HashAlgorithm};

use crate::NODE_DOMAIN_TAG;

/// Which side of the current running hash a proof step's sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One step of a Merkle inclusion proof: a sibling digest and which side it
/// combines on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub side: Side,
    pub sibling: Digest,
}

/// `(leaf-digest, path)` — an inclusion proof. `path.len()` equals the
/// tree's depth.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    pub leaf_digest: Digest,
    pub path: Vec<ProofStep>,
    pub algorithm: HashAlgorithm,
}

/// Why [`MerkleProof::verify`] failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("recomputed root does not match the expected root")]
    RootMismatch,
}

impl MerkleProof {
    /// Walk the path, combining hashes on the side each step declares, and
    /// compare the final value to `expected_root` (constant-time, via
    /// [`Digest`]'s `PartialEq`). `O(log n)`.
    pub fn verify(&self, expected_root: &Digest) -> Result<(), VerifyError> {
        let mut current = self.leaf_digest.clone();
        for step in &self.path {
            current = match step.side {
                Side::Left => combine(self.algorithm, NODE_DOMAIN_TAG, &step.sibling, &current),
                Side::Right => combine(self.algorithm, NODE_DOMAIN_TAG, &current, &step.sibling),
            };
        }
        if &current == expected_root {
            Ok(())
        } else {
            Err(VerifyError::RootMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MerkleTree;
    use ochrance_oracle::oracle;

    #[test]
    fn tampered_sibling_breaks_verification() {
        let leaves: Vec<Digest> = (0..8)
            .map(|i| oracle(HashAlgorithm::Sha256, &[i as u8]))
            .collect();
        let tree = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        let root = tree.root_digest();
        let mut proof = tree.prove(3).unwrap();
        assert!(proof.verify(&root).is_ok());

        proof.path[0].sibling = oracle(HashAlgorithm::Sha256, b"tampered");
        assert!(proof.verify(&root).is_err());
    }

    #[test]
    fn tampered_leaf_breaks_verification() {
        let leaves: Vec<Digest> = (0..8)
            .map(|i| oracle(HashAlgorithm::Sha256, &[i as u8]))
            .collect();
        let tree = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        let root = tree.root_digest();
        let mut proof = tree.prove(3).unwrap();

        proof.leaf_digest = oracle(HashAlgorithm::Sha256, b"tampered");
        assert!(proof.verify(&root).is_err());
    }
}
