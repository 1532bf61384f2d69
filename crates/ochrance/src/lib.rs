//! Ochránce: neurosymbolic filesystem integrity verification.
//!
//! This crate is the façade binding the lower layers together:
//! [`ochrance_oracle`] (content hashing), [`ochrance_merkle`] (structural
//! aggregation), [`ochrance_verify`] (proof witnesses and the verifier),
//! [`ochrance_repair`] (the Ephapax repair engine), and [`ochrance_a2ml`]
//! (the attestation wire format). See [`facade::VerifiedSubsystem`] and
//! [`document::AttestationDocument`].
#![forbid(unsafe_code)]

pub mod document;
pub mod facade;

pub use document::{attestation_metadata, manifest_from_refs, AttestationDocument, AuditEntry, DocumentReadError, PolicySummary};
pub use facade::{remediation_for, verify_or_repair, verify_or_repair_tracked, Filesystem, GuardedFilesystem, VerifiedSubsystem};

pub use ochrance_a2ml::{parse_document, serialize_document, DocumentError};
pub use ochrance_diagnostic::{Diagnostic, Priority, Query, Zone};
pub use ochrance_oracle::{oracle, Digest, HashAlgorithm};
pub use ochrance_repair::{EphapaxToken, RepairAction, RepairResult};
pub use ochrance_verify::{Block, BlockMetadata, FsManifest, FsState, Tier, VerificationMode, Witness};
