//! Property tests for Merkle determinism and inclusion-soundness.

use ochrance_merkle::MerkleTree;
use ochrance_oracle::{oracle, Digest, HashAlgorithm};
use proptest::prelude::*;

fn arb_leaves(max: usize) -> impl Strategy<Value = Vec<Digest>> {
    proptest::collection::vec(any::<Vec<u8>>(), 0..max)
        .prop_map(|payloads| {
            payloads
                .into_iter()
                .map(|bytes| oracle(HashAlgorithm::Sha256, &bytes))
                .collect()
        })
}

proptest! {
    #[test]
    fn merkle_root_is_deterministic(leaves in arb_leaves(64)) {
        let a = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        let b = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        prop_assert_eq!(a.root_digest(), b.root_digest());
    }

    #[test]
    fn every_leaf_proof_verifies_against_the_root(leaves in arb_leaves(64)) {
        prop_assume!(!leaves.is_empty());
        let tree = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        let root = tree.root_digest();
        for i in 0..leaves.len() {
            let proof = tree.prove(i).expect("index in range");
            prop_assert!(proof.verify(&root).is_ok());
        }
    }

    #[test]
    fn flipping_any_proof_byte_fails_verification(leaves in arb_leaves(32), flip_index in 0usize..32) {
        prop_assume!(leaves.len() >= 2);
        let tree = MerkleTree::build(HashAlgorithm::Sha256, &leaves);
        let root = tree.root_digest();
        let mut proof = tree.prove(0).expect("index 0 exists");
        if let Some(step) = proof.path.first_mut() {
            let mut bytes = step.sibling.as_bytes().to_vec();
            let idx = flip_index % bytes.len();
            bytes[idx] ^= 0x01;
            step.sibling = Digest::from_hex(HashAlgorithm::Sha256, &hex::encode(bytes)).unwrap();
            prop_assert!(proof.verify(&root).is_err());
        }
    }
}
