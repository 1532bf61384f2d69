//! CLI and conformance harness for the ochrance filesystem integrity
//! verifier. This crate is a thin binding layer: everything it exposes is
//! assembled from `ochrance` and its dependency crates, plus the `@audit`
//! JSONL emitter and a conformance scenario matrix.
#![forbid(unsafe_code)]

pub mod audit_log;
pub mod conformance_matrix;

pub use audit_log::{is_prefix_stable, verify_chain, AuditAction, AuditEmitter, AuditOutcome, AuditRecord};
pub use conformance_matrix::{run_all, ScenarioOutcome, ScenarioReport};
