//! Snapshot-based repair engine with Ephapax single-use token discipline.
#![forbid(unsafe_code)]

mod action;
mod engine;
mod snapshot;
mod token;

pub use action::RepairAction;
pub use engine::{repair, RepairResult};
pub use snapshot::{decode_payload, encode_payload, DecodedSnapshot, Snapshot, SnapshotError};
pub use token::EphapaxToken;
