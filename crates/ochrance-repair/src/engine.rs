//! The repair engine: consumes an [`EphapaxToken`], decodes a [`Snapshot`],
//! mutates an [`FsState`], and re-verifies.

use ochrance_diagnostic::{Diagnostic, Priority, Query, Zone};
use ochrance_verify::{verify, BlockMetadata, FsManifest, FsState, VerificationMode};

use crate::action::RepairAction;
use crate::snapshot::Snapshot;
use crate::token::EphapaxToken;

/// Outcome of a repair cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairResult {
    /// Repair succeeded and re-verification at the original mode passed.
    RepairOk { blocks_restored: usize },
    /// Some step failed; `reason` is the diagnostic that explains why.
    RepairFailed { reason: Diagnostic },
}

/// Run one repair cycle: decode `snapshot`, apply the action `token`
/// carries to `state`, then re-verify at `mode` (the mode at which the
/// original failure was detected). Consumes `token` — the Ephapax
/// discipline guarantees this permit can fund at most one call.
pub fn repair(
    state: &mut FsState,
    manifest: &FsManifest,
    snapshot: &Snapshot,
    token: EphapaxToken,
    mode: VerificationMode,
) -> RepairResult {
    let action = token.consume();

    let decoded = match snapshot.decode(manifest.algorithm()) {
        Ok(decoded) => decoded,
        Err(err) => {
            return RepairResult::RepairFailed {
                reason: Diagnostic::new(
                    Query::SnapshotCorrupt {
                        detail: err.to_string(),
                    },
                    Priority::Error,
                    Zone::full_subsystem("repair"),
                ),
            }
        }
    };

    if decoded.n() != state.n() {
        return RepairResult::RepairFailed {
            reason: Diagnostic::new(
                Query::SnapshotIncompatible {
                    expected_n: state.n(),
                    actual_n: decoded.n(),
                },
                Priority::Error,
                Zone::full_subsystem("repair"),
            ),
        };
    }

    let blocks_restored = match apply_action(&action, state, &decoded, manifest.algorithm()) {
        Ok(count) => count,
        Err(reason) => return RepairResult::RepairFailed { reason },
    };

    match verify(mode, state, manifest) {
        Ok(_) => RepairResult::RepairOk { blocks_restored },
        Err(reason) => RepairResult::RepairFailed { reason },
    }
}

fn apply_action(
    action: &RepairAction,
    state: &mut FsState,
    decoded: &crate::snapshot::DecodedSnapshot,
    algorithm: ochrance_oracle::HashAlgorithm,
) -> Result<usize, Diagnostic> {
    match action {
        RepairAction::RestoreBlock(index) => restore_one(state, decoded, *index).map(|()| 1),
        RepairAction::RewriteMetadata { index, .. } => {
            let metadata = decoded
                .metadata
                .get(*index)
                .ok_or_else(|| index_out_of_range(*index))?
                .clone();
            state
                .replace_metadata(*index, metadata)
                .map(|()| 1)
                .ok_or_else(|| index_out_of_range(*index))
        }
        RepairAction::QuarantineFile { index, .. } => {
            let mut metadata = state
                .metadata()
                .get(*index)
                .cloned()
                .ok_or_else(|| index_out_of_range(*index))?;
            metadata.read_only = true;
            state
                .replace_metadata(*index, metadata)
                .ok_or_else(|| index_out_of_range(*index))?;
            state
                .zero_block_digest(*index, algorithm)
                .map(|()| 1)
                .ok_or_else(|| index_out_of_range(*index))
        }
        RepairAction::RebuildIndex => {
            let mut restored = 0;
            for index in 0..state.n() {
                restore_one(state, decoded, index)?;
                restored += 1;
            }
            Ok(restored)
        }
    }
}

fn restore_one(
    state: &mut FsState,
    decoded: &crate::snapshot::DecodedSnapshot,
    index: usize,
) -> Result<(), Diagnostic> {
    let block = decoded
        .blocks
        .get(index)
        .ok_or_else(|| index_out_of_range(index))?
        .clone();
    let metadata: BlockMetadata = decoded
        .metadata
        .get(index)
        .cloned()
        .ok_or_else(|| index_out_of_range(index))?;
    state
        .replace_block(index, block, metadata)
        .ok_or_else(|| index_out_of_range(index))
}

fn index_out_of_range(index: usize) -> Diagnostic {
    Diagnostic::new(
        Query::InvariantViolation {
            detail: format!("repair action referenced out-of-range index {index}"),
        },
        Priority::Critical,
        Zone::single_block(index.to_string()),
    )
}
