//! `RepairAction` — the enumerated remediations a token can carry.

/// A specific remediation a repair cycle will apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// Replace exactly block `index` and its metadata from the snapshot.
    RestoreBlock(usize),
    /// Replace metadata at the resolved index for `path`.
    RewriteMetadata { index: usize, path: String },
    /// Mark the block read-only and zero its data-hash field.
    QuarantineFile { index: usize, path: String },
    /// Full restore from snapshot.
    RebuildIndex,
}
