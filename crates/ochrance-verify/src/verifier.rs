//! The filesystem verifier: Lax/Checked/Attested procedures over an
//! `(FsState, FsManifest)` pair.

use ochrance_diagnostic::{Diagnostic, Priority, Query, Zone};
use ochrance_merkle::MerkleTree;

use crate::mode::VerificationMode;
use crate::model::{FsManifest, FsState};
use crate::time::now_utc;
use crate::witness::{AttestationMetadata, HashEquality, Witness};

/// Run the procedure `mode` names: Lax checks structural shape only
/// (`O(1)`); Checked additionally verifies every block's leaf-digest
/// (`O(n)`); Attested additionally recomputes and checks the Merkle root
/// (`O(n)`). Each tier's procedure is a strict superset of the weaker
/// tier's, so success at `Attested` implies what `Checked` and `Lax`
/// would also have found.
pub fn verify(mode: VerificationMode, state: &FsState, manifest: &FsManifest) -> Result<Witness, Diagnostic> {
    verify_lax(state, manifest)?;
    if mode == VerificationMode::Lax {
        return Ok(Witness::Structural);
    }

    let evidence = verify_checked(state, manifest)?;
    if mode == VerificationMode::Checked {
        return Ok(Witness::HashMatch { evidence });
    }

    verify_attested(manifest, evidence)
}

fn verify_lax(state: &FsState, manifest: &FsManifest) -> Result<(), Diagnostic> {
    if state.n() != manifest.n() {
        return Err(Diagnostic::new(
            Query::MissingStructure {
                detail: format!("state has {} blocks, manifest declares {}", state.n(), manifest.n()),
            },
            Priority::Error,
            Zone::full_subsystem("filesystem"),
        ));
    }

    if manifest.format_version().is_empty() {
        return Err(Diagnostic::new(
            Query::InvariantViolation {
                detail: "manifest format_version is empty".to_owned(),
            },
            Priority::Error,
            Zone::full_subsystem("filesystem"),
        ));
    }

    if state.metadata().len() != state.blocks().len() {
        return Err(Diagnostic::new(
            Query::InvariantViolation {
                detail: "metadata vector length disagrees with block vector length".to_owned(),
            },
            Priority::Critical,
            Zone::full_subsystem("filesystem"),
        ));
    }

    Ok(())
}

fn verify_checked(state: &FsState, manifest: &FsManifest) -> Result<Vec<HashEquality>, Diagnostic> {
    let mut evidence = Vec::with_capacity(state.n());
    let mut mismatches = Vec::new();

    for (index, (block, expected)) in state.blocks().iter().zip(manifest.block_digests()).enumerate() {
        let computed = block.leaf_digest();
        if computed == expected {
            evidence.push(HashEquality {
                computed: computed.to_wire(),
                expected: expected.to_wire(),
            });
        } else {
            mismatches.push((index, computed.to_wire(), expected.to_wire()));
        }
    }

    if let Some((index, computed, expected)) = mismatches.into_iter().next() {
        return Err(Diagnostic::new(
            Query::HashMismatch {
                field: "blocks".to_owned(),
                expected,
                actual: computed,
            },
            Priority::Error,
            Zone::single_block(index.to_string()),
        ));
    }

    Ok(evidence)
}

fn verify_attested(manifest: &FsManifest, evidence: Vec<HashEquality>) -> Result<Witness, Diagnostic> {
    let tree = MerkleTree::build(manifest.algorithm(), manifest.block_digests());
    let recomputed = tree.root_digest();

    if &recomputed != manifest.root_digest() {
        return Err(Diagnostic::new(
            Query::HashMismatch {
                field: "merkle-root".to_owned(),
                expected: manifest.root_digest().to_wire(),
                actual: recomputed.to_wire(),
            },
            Priority::Critical,
            Zone::full_subsystem("filesystem"),
        ));
    }

    let promoted = Witness::HashMatch { evidence }
        .promote_to_attested(AttestationMetadata {
            timestamp: now_utc(),
            invariant_satisfied: true,
        })
        .expect("a freshly built HashMatch witness always promotes to Attested");
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockMetadata, BLOCK_SIZE};
    use crate::witness::Tier;
    use ochrance_oracle::HashAlgorithm;

    fn fixture(n: usize) -> (FsState, FsManifest) {
        let blocks: Vec<Block> = (0..n).map(|_| Block::new(HashAlgorithm::Sha256, vec![0u8; BLOCK_SIZE])).collect();
        let metadata: Vec<BlockMetadata> = (0..n)
            .map(|_| BlockMetadata::new("2026-07-28T00:00:00Z", "root", false))
            .collect();
        let digests = blocks.iter().map(|b| b.leaf_digest().clone()).collect();
        let manifest = FsManifest::build(HashAlgorithm::Sha256, digests, "1");
        let state = FsState::new(blocks, metadata).unwrap();
        (state, manifest)
    }

    #[test]
    fn happy_path_attested() {
        let (state, manifest) = fixture(4);
        let witness = verify(VerificationMode::Attested, &state, &manifest).unwrap();
        assert_eq!(witness.tier(), Tier::Attested);
    }

    #[test]
    fn single_bit_flip_fails_checked() {
        let (mut state, manifest) = fixture(4);
        let mut bytes = state.blocks()[2].raw_bytes().to_vec();
        bytes[0] ^= 0x01;
        state
            .replace_block(2, Block::new(HashAlgorithm::Sha256, bytes), BlockMetadata::new("t", "root", false))
            .unwrap();

        let err = verify(VerificationMode::Checked, &state, &manifest).unwrap_err();
        assert!(matches!(err.query, Query::HashMismatch { ref field, .. } if field == "blocks"));
        assert_eq!(err.zone, Zone::single_block("2".to_owned()));
    }

    #[test]
    fn lax_passes_where_checked_fails() {
        let (mut state, manifest) = fixture(4);
        let mut bytes = state.blocks()[2].raw_bytes().to_vec();
        bytes[0] ^= 0x01;
        state
            .replace_block(2, Block::new(HashAlgorithm::Sha256, bytes), BlockMetadata::new("t", "root", false))
            .unwrap();

        let witness = verify(VerificationMode::Lax, &state, &manifest).unwrap();
        assert_eq!(witness, Witness::Structural);
    }

    #[test]
    fn merkle_root_tamper_fails_only_attested() {
        let (state, manifest) = fixture(4);
        let tampered_root_bytes: Vec<u8> = manifest.root_digest().as_bytes().iter().map(|b| !b).collect();
        let tampered = ochrance_oracle::Digest::from_hex(HashAlgorithm::Sha256, &hex::encode(tampered_root_bytes)).unwrap();
        let manifest = FsManifest::from_parts(
            HashAlgorithm::Sha256,
            tampered,
            manifest.block_digests().to_vec(),
            manifest.format_version().to_owned(),
        );

        assert!(verify(VerificationMode::Checked, &state, &manifest).is_ok());
        let err = verify(VerificationMode::Attested, &state, &manifest).unwrap_err();
        assert!(matches!(err.query, Query::HashMismatch { ref field, .. } if field == "merkle-root"));
    }

    #[test]
    fn monotonicity_attested_success_implies_checked_and_lax() {
        let (state, manifest) = fixture(8);
        assert!(verify(VerificationMode::Attested, &state, &manifest).is_ok());
        assert!(verify(VerificationMode::Checked, &state, &manifest).is_ok());
        assert!(verify(VerificationMode::Lax, &state, &manifest).is_ok());
    }

    #[test]
    fn monotonicity_lax_failure_implies_all_modes_fail() {
        let (state, manifest) = fixture(4);
        let mut bad_state = state;
        bad_state = FsState::new(bad_state.blocks()[..3].to_vec(), bad_state.metadata()[..3].to_vec()).unwrap();

        for mode in [VerificationMode::Lax, VerificationMode::Checked, VerificationMode::Attested] {
            assert!(verify(mode, &bad_state, &manifest).is_err());
        }
    }
}
