use std::fmt;

use serde::{Deserialize, Serialize};

/// The structural cause of a diagnostic — the `q` of q/p/z.
///
/// Covers every named failure cause across the A2ML engine, Merkle engine,
/// filesystem verifier, and repair engine so that one `Diagnostic` type can
/// be threaded through the whole workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "kebab-case")]
pub enum Query {
    MissingStructure { detail: String },
    HashMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    MissingSection { name: String },
    MissingRequired { name: String },
    DuplicateSection { name: String },
    VersionMismatch { expected: String, actual: String },
    InvariantViolation { detail: String },
    ParseFailure {
        line: u32,
        column: u32,
        detail: String,
    },
    UnterminatedString { line: u32, column: u32 },
    MalformedHash { line: u32, column: u32 },
    UnknownKeyword { line: u32, column: u32, keyword: String },
    UnexpectedCharacter { line: u32, column: u32, found: char },
    NestingExceeded { limit: u32 },
    CapExceeded { what: String, limit: usize, actual: usize },
    IoFailure { detail: String },
    SnapshotCorrupt { detail: String },
    SnapshotIncompatible { expected_n: usize, actual_n: usize },
    UnknownHashAlgorithm { tag: String },
    RepairExhausted { attempts: u32 },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStructure { detail } => write!(f, "missing-structure: {detail}"),
            Self::HashMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "hash-mismatch on {field}: expected {expected}, got {actual}"
            ),
            Self::MissingSection { name } => write!(f, "missing-section({name})"),
            Self::MissingRequired { name } => write!(f, "missing-required({name:?})"),
            Self::DuplicateSection { name } => write!(f, "duplicate-section({name:?})"),
            Self::VersionMismatch { expected, actual } => {
                write!(f, "version-mismatch: expected {expected}, got {actual}")
            }
            Self::InvariantViolation { detail } => write!(f, "invariant-violation: {detail}"),
            Self::ParseFailure {
                line,
                column,
                detail,
            } => write!(f, "parse-failure at {line}:{column}: {detail}"),
            Self::UnterminatedString { line, column } => {
                write!(f, "unterminated-string at {line}:{column}")
            }
            Self::MalformedHash { line, column } => write!(f, "malformed-hash at {line}:{column}"),
            Self::UnknownKeyword {
                line,
                column,
                keyword,
            } => write!(f, "unknown-keyword({keyword}) at {line}:{column}"),
            Self::UnexpectedCharacter {
                line,
                column,
                found,
            } => write!(f, "unexpected-character({found:?}) at {line}:{column}"),
            Self::NestingExceeded { limit } => write!(f, "nesting-exceeded(limit={limit})"),
            Self::CapExceeded { what, limit, actual } => {
                write!(f, "cap-exceeded({what}: limit={limit}, actual={actual})")
            }
            Self::IoFailure { detail } => write!(f, "io-failure: {detail}"),
            Self::SnapshotCorrupt { detail } => write!(f, "snapshot-corrupt: {detail}"),
            Self::SnapshotIncompatible {
                expected_n,
                actual_n,
            } => write!(
                f,
                "snapshot-incompatible: expected n={expected_n}, got n={actual_n}"
            ),
            Self::UnknownHashAlgorithm { tag } => write!(f, "unknown-hash-algorithm({tag})"),
            Self::RepairExhausted { attempts } => write!(f, "repair-exhausted(attempts={attempts})"),
        }
    }
}
