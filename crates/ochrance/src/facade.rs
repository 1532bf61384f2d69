//! `VerifiedSubsystem`: the three-capability façade (verify, repair, attest)
//! any integrity-checked subsystem implements, plus the `verify-or-repair`
//! convenience pipeline built on top of it.

use parking_lot::RwLock;

use ochrance_diagnostic::{Diagnostic, Query, Zone};
use ochrance_oracle::HashAlgorithm;
use ochrance_repair::{repair, EphapaxToken, RepairAction, RepairResult, Snapshot};
use ochrance_verify::{verify, FsManifest, FsState, VerificationMode, Witness};

/// A subsystem bound to concrete state/manifest/snapshot types, exposing
/// three capabilities: `verify` (pure), `repair` (effectful), `attest`
/// (effectful, reads state).
pub trait VerifiedSubsystem {
    type State;
    type Manifest;
    type Snapshot;

    fn verify(&self, mode: VerificationMode, state: &Self::State, manifest: &Self::Manifest) -> Result<Witness, Diagnostic>;

    fn repair(
        &self,
        state: &mut Self::State,
        manifest: &Self::Manifest,
        snapshot: &Self::Snapshot,
        token: EphapaxToken,
        mode: VerificationMode,
    ) -> RepairResult;

    fn attest(&self, state: &Self::State, algorithm: HashAlgorithm, format_version: &str) -> Self::Manifest;
}

/// The one subsystem this workspace implements: a block-addressed
/// filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filesystem;

impl VerifiedSubsystem for Filesystem {
    type State = FsState;
    type Manifest = FsManifest;
    type Snapshot = Snapshot;

    fn verify(&self, mode: VerificationMode, state: &FsState, manifest: &FsManifest) -> Result<Witness, Diagnostic> {
        verify(mode, state, manifest)
    }

    fn repair(
        &self,
        state: &mut FsState,
        manifest: &FsManifest,
        snapshot: &Snapshot,
        token: EphapaxToken,
        mode: VerificationMode,
    ) -> RepairResult {
        repair(state, manifest, snapshot, token, mode)
    }

    fn attest(&self, state: &FsState, algorithm: HashAlgorithm, format_version: &str) -> FsManifest {
        let digests = state.blocks().iter().map(|b| b.leaf_digest().clone()).collect();
        FsManifest::build(algorithm, digests, format_version)
    }
}

/// Attempt verification; on a remediable failure, perform a single repair
/// cycle and re-verify. Returns the original failure unchanged when no
/// repair action applies, so callers can't mistake "not remediable" for
/// "remediation attempted and failed".
pub fn verify_or_repair<S: VerifiedSubsystem>(
    subsystem: &S,
    state: &mut S::State,
    manifest: &S::Manifest,
    snapshot: &S::Snapshot,
    mode: VerificationMode,
) -> Result<Witness, Diagnostic> {
    verify_or_repair_tracked(subsystem, state, manifest, snapshot, mode).0
}

/// Same pipeline as [`verify_or_repair`], but also reports whether a repair
/// cycle was actually invoked (as opposed to the initial verification
/// simply succeeding, or failing in a way [`remediation_for`] can't act on).
/// Callers that need to distinguish "never attempted" from "attempted and
/// still failed" — e.g. to pick an exit code — should use this instead of
/// inferring intent from the returned diagnostic's shape.
pub fn verify_or_repair_tracked<S: VerifiedSubsystem>(
    subsystem: &S,
    state: &mut S::State,
    manifest: &S::Manifest,
    snapshot: &S::Snapshot,
    mode: VerificationMode,
) -> (Result<Witness, Diagnostic>, bool) {
    match subsystem.verify(mode, state, manifest) {
        Ok(witness) => (Ok(witness), false),
        Err(diagnostic) => {
            let Some(action) = remediation_for(&diagnostic) else {
                return (Err(diagnostic), false);
            };
            let token = EphapaxToken::issue(action);
            let outcome = match subsystem.repair(state, manifest, snapshot, token, mode) {
                RepairResult::RepairOk { .. } => subsystem.verify(mode, state, manifest),
                RepairResult::RepairFailed { reason } => Err(reason),
            };
            (outcome, true)
        }
    }
}

/// Per-subsystem exclusive guard: a verification-in-progress must not race
/// with a repair on the same state. Plain verifications take the read side
/// and may run concurrently with each other; [`GuardedFilesystem::verify_or_repair`]
/// takes the write side for its entire call, so no reader can observe state
/// between a remediable failure's token issuance and the repair's
/// re-verification.
pub struct GuardedFilesystem {
    subsystem: Filesystem,
    state: RwLock<FsState>,
}

impl GuardedFilesystem {
    #[must_use]
    pub fn new(state: FsState) -> Self {
        Self {
            subsystem: Filesystem,
            state: RwLock::new(state),
        }
    }

    /// Read-locked verification; may run concurrently with other `verify`
    /// calls, never with an in-flight `verify_or_repair`.
    pub fn verify(&self, mode: VerificationMode, manifest: &FsManifest) -> Result<Witness, Diagnostic> {
        let guard = self.state.read();
        self.subsystem.verify(mode, &guard, manifest)
    }

    /// Write-locked verify-then-repair-then-reverify.
    pub fn verify_or_repair(
        &self,
        manifest: &FsManifest,
        snapshot: &Snapshot,
        mode: VerificationMode,
    ) -> Result<Witness, Diagnostic> {
        let mut guard = self.state.write();
        verify_or_repair(&self.subsystem, &mut guard, manifest, snapshot, mode)
    }

    pub fn attest(&self, algorithm: HashAlgorithm, format_version: &str) -> FsManifest {
        let guard = self.state.read();
        self.subsystem.attest(&guard, algorithm, format_version)
    }

    /// Snapshot the current state under a read lock, for callers that need
    /// an owned copy (e.g. to build a repair [`Snapshot`] out of band).
    #[must_use]
    pub fn state_snapshot(&self) -> FsState {
        self.state.read().clone()
    }
}

/// Classify a diagnostic as remediable or fatal. Only a single-block hash
/// mismatch is remediable here; a merkle-root mismatch is fatal because the
/// manifest is the authoritative source for that root.
#[must_use]
pub fn remediation_for(diagnostic: &Diagnostic) -> Option<RepairAction> {
    let Query::HashMismatch { field, .. } = &diagnostic.query else {
        return None;
    };
    if field != "blocks" {
        return None;
    }
    let Zone::SingleBlock { path } = &diagnostic.zone else {
        return None;
    };
    path.parse::<usize>().ok().map(RepairAction::RestoreBlock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ochrance_verify::{Block, BlockMetadata};

    fn fixture(n: usize) -> (FsState, FsManifest, Snapshot) {
        let blocks: Vec<Block> = (0..n).map(|i| Block::new(HashAlgorithm::Sha256, vec![i as u8; 16])).collect();
        let metadata: Vec<BlockMetadata> = (0..n)
            .map(|_| BlockMetadata::new("2026-07-28T00:00:00Z", "root", false))
            .collect();
        let digests = blocks.iter().map(|b| b.leaf_digest().clone()).collect();
        let manifest = FsManifest::build(HashAlgorithm::Sha256, digests, "1");
        let snapshot = Snapshot::capture("snap-1", "2026-07-28T00:00:00Z", &blocks, &metadata);
        let state = FsState::new(blocks, metadata).unwrap();
        (state, manifest, snapshot)
    }

    #[test]
    fn verify_or_repair_heals_a_single_bit_flip() {
        let (mut state, manifest, snapshot) = fixture(4);
        let mut bytes = state.blocks()[1].raw_bytes().to_vec();
        bytes[0] ^= 0x01;
        state
            .replace_block(1, Block::new(HashAlgorithm::Sha256, bytes), BlockMetadata::new("t", "root", false))
            .unwrap();

        let subsystem = Filesystem;
        let witness = verify_or_repair(&subsystem, &mut state, &manifest, &snapshot, VerificationMode::Checked).unwrap();
        assert_eq!(witness.tier(), ochrance_verify::Tier::HashMatch);
    }

    #[test]
    fn verify_or_repair_passes_through_fatal_failures() {
        let (state, manifest, snapshot) = fixture(4);
        let mut bad_state = FsState::new(state.blocks()[..3].to_vec(), state.metadata()[..3].to_vec()).unwrap();
        let subsystem = Filesystem;
        let err = verify_or_repair(&subsystem, &mut bad_state, &manifest, &snapshot, VerificationMode::Lax).unwrap_err();
        assert!(matches!(err.query, Query::MissingStructure { .. }));
    }

    #[test]
    fn attest_builds_a_manifest_matching_the_state() {
        let (state, manifest, _) = fixture(3);
        let subsystem = Filesystem;
        let attested = subsystem.attest(&state, HashAlgorithm::Sha256, "1");
        assert_eq!(attested.root_digest(), manifest.root_digest());
    }

    #[test]
    fn guarded_filesystem_heals_through_the_exclusive_window() {
        let (mut state, manifest, snapshot) = fixture(4);
        let mut bytes = state.blocks()[1].raw_bytes().to_vec();
        bytes[0] ^= 0x01;
        state
            .replace_block(1, Block::new(HashAlgorithm::Sha256, bytes), BlockMetadata::new("t", "root", false))
            .unwrap();

        let guarded = GuardedFilesystem::new(state);
        let witness = guarded.verify_or_repair(&manifest, &snapshot, VerificationMode::Checked).unwrap();
        assert_eq!(witness.tier(), ochrance_verify::Tier::HashMatch);
        assert!(guarded.verify(VerificationMode::Checked, &manifest).is_ok());
    }

    #[test]
    fn a_read_lock_cannot_be_taken_while_the_write_side_is_held() {
        // Holding the write guard (the window `verify_or_repair` occupies)
        // must block every reader.
        let (state, _, _) = fixture(2);
        let guarded = GuardedFilesystem::new(state);
        let _write_guard = guarded.state.write();
        assert!(guarded.state.try_read().is_none());
    }

    #[test]
    fn concurrent_reads_do_not_block_each_other() {
        let (state, _, _) = fixture(2);
        let guarded = GuardedFilesystem::new(state);
        let first = guarded.state.read();
        let second = guarded.state.try_read();
        assert!(second.is_some());
        drop(first);
        drop(second);
    }
}
