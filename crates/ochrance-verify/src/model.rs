//! Value types for the data model, with the length invariant established
//! once at construction rather than carried in the type: a constructor is
//! the sole point where `n` is fixed, and every other operation treats it
//! as a checked-at-the-boundary precondition.

use ochrance_oracle::{oracle, Digest, HashAlgorithm};

/// System-wide block size in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// A block's non-content metadata. Never participates in integrity hashing
/// unless the manifest explicitly incorporates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMetadata {
    pub modified_at: String,
    pub owner: String,
    pub read_only: bool,
}

impl BlockMetadata {
    #[must_use]
    pub fn new(modified_at: impl Into<String>, owner: impl Into<String>, read_only: bool) -> Self {
        Self {
            modified_at: modified_at.into(),
            owner: owner.into(),
            read_only,
        }
    }
}

/// `(raw-bytes, leaf-digest)` where `leaf-digest = oracle(raw-bytes)`.
/// The digest is computed once at construction, never recomputed
/// implicitly, so a caller can never observe a `Block` whose digest
/// doesn't match its bytes.
#[derive(Debug, Clone)]
pub struct Block {
    raw_bytes: Vec<u8>,
    leaf_digest: Digest,
}

impl Block {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, raw_bytes: Vec<u8>) -> Self {
        let leaf_digest = oracle(algorithm, &raw_bytes);
        Self { raw_bytes, leaf_digest }
    }

    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    #[must_use]
    pub fn leaf_digest(&self) -> &Digest {
        &self.leaf_digest
    }

    /// Zero the digest field in place, decoupled from `raw_bytes` — used by
    /// the repair engine's `quarantine-file` action. The block's bytes are
    /// left untouched; only the cached digest is overwritten, so a
    /// quarantined block can never be mistaken for one whose digest still
    /// attests to its content.
    pub fn zero_digest(&mut self, algorithm: HashAlgorithm) {
        self.leaf_digest = Digest::zero(algorithm);
    }
}

/// Error establishing an [`FsState`]'s length invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LengthError {
    #[error("block vector has length {blocks} but metadata vector has length {metadata}")]
    MismatchedVectors { blocks: usize, metadata: usize },
}

/// `FSState(n)`: an ordered collection of exactly `n` blocks with matching
/// metadata. Created when the subsystem reads a device; mutated only by
/// the repair engine.
#[derive(Debug, Clone)]
pub struct FsState {
    blocks: Vec<Block>,
    metadata: Vec<BlockMetadata>,
}

impl FsState {
    /// The sole point of length establishment: rejects mismatched vectors
    /// up front so every other method can assume `blocks.len() ==
    /// metadata.len()` without re-checking.
    pub fn new(blocks: Vec<Block>, metadata: Vec<BlockMetadata>) -> Result<Self, LengthError> {
        if blocks.len() != metadata.len() {
            return Err(LengthError::MismatchedVectors {
                blocks: blocks.len(),
                metadata: metadata.len(),
            });
        }
        Ok(Self { blocks, metadata })
    }

    #[must_use]
    pub fn n(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn metadata(&self) -> &[BlockMetadata] {
        &self.metadata
    }

    /// Replace exactly block `index` and its metadata — the sole mutation
    /// path, used by the repair engine's `restore-block` action.
    pub fn replace_block(&mut self, index: usize, block: Block, metadata: BlockMetadata) -> Option<()> {
        let slot_b = self.blocks.get_mut(index)?;
        let slot_m = self.metadata.get_mut(index)?;
        *slot_b = block;
        *slot_m = metadata;
        Some(())
    }

    /// Zero block `index`'s digest field in place, used by the repair
    /// engine's `quarantine-file` action.
    pub fn zero_block_digest(&mut self, index: usize, algorithm: HashAlgorithm) -> Option<()> {
        let slot = self.blocks.get_mut(index)?;
        slot.zero_digest(algorithm);
        Some(())
    }

    /// Replace just the metadata at `index`, leaving block content intact
    /// — used by `rewrite-metadata`.
    pub fn replace_metadata(&mut self, index: usize, metadata: BlockMetadata) -> Option<()> {
        let slot = self.metadata.get_mut(index)?;
        *slot = metadata;
        Some(())
    }
}

/// `FSManifest(n)`: `(root-digest, per-block-digest-vector[n],
/// format-version)`. Immutable once created; `root-digest` is fixed to
/// `merkle-root(per-block-digest-vector)` at construction time, so there
/// is no way to build one with a stale or mismatched root.
#[derive(Debug, Clone)]
pub struct FsManifest {
    root_digest: Digest,
    block_digests: Vec<Digest>,
    format_version: String,
    algorithm: HashAlgorithm,
}

impl FsManifest {
    /// Build a manifest over `block_digests`, computing the Merkle root at
    /// construction time — the only way a manifest's `root_digest` is ever
    /// set.
    #[must_use]
    pub fn build(algorithm: HashAlgorithm, block_digests: Vec<Digest>, format_version: impl Into<String>) -> Self {
        let tree = ochrance_merkle::MerkleTree::build(algorithm, &block_digests);
        Self {
            root_digest: tree.root_digest(),
            block_digests,
            format_version: format_version.into(),
            algorithm,
        }
    }

    /// Reconstruct a manifest from an already-known root and digest vector.
    /// Used when deserializing an A2ML document whose root was computed
    /// elsewhere. Does not recompute or reject a mismatched root: a root
    /// that disagrees with `merkle-root(block_digests)` is a content
    /// mismatch, not a structural one, and is reported by the verifier as a
    /// hash-mismatch diagnostic rather than rejected at reconstruction time.
    #[must_use]
    pub fn from_parts(
        algorithm: HashAlgorithm,
        root_digest: Digest,
        block_digests: Vec<Digest>,
        format_version: impl Into<String>,
    ) -> Self {
        Self {
            root_digest,
            block_digests,
            format_version: format_version.into(),
            algorithm,
        }
    }

    #[must_use]
    pub fn n(&self) -> usize {
        self.block_digests.len()
    }

    #[must_use]
    pub fn root_digest(&self) -> &Digest {
        &self.root_digest
    }

    #[must_use]
    pub fn block_digests(&self) -> &[Digest] {
        &self.block_digests
    }

    #[must_use]
    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(n: u8) -> Block {
        Block::new(HashAlgorithm::Sha256, vec![n; BLOCK_SIZE])
    }

    fn metadata() -> BlockMetadata {
        BlockMetadata::new("2026-07-28T00:00:00Z", "root", false)
    }

    #[test]
    fn fs_state_rejects_mismatched_vectors() {
        let err = FsState::new(vec![block(0), block(1)], vec![metadata()]).unwrap_err();
        assert!(matches!(err, LengthError::MismatchedVectors { .. }));
    }

    #[test]
    fn fs_state_replace_block_updates_in_place() {
        let mut state = FsState::new(vec![block(0), block(1)], vec![metadata(), metadata()]).unwrap();
        let original_digest = state.blocks()[0].leaf_digest().clone();
        state.replace_block(0, block(9), metadata()).unwrap();
        assert_ne!(state.blocks()[0].leaf_digest(), &original_digest);
    }

    #[test]
    fn manifest_root_matches_merkle_engine() {
        let digests = vec![block(0).leaf_digest().clone(), block(1).leaf_digest().clone()];
        let manifest = FsManifest::build(HashAlgorithm::Sha256, digests.clone(), "1");
        let tree = ochrance_merkle::MerkleTree::build(HashAlgorithm::Sha256, &digests);
        assert_eq!(manifest.root_digest(), &tree.root_digest());
    }
}
