//! The `@audit` JSONL emitter: structured, append-only records of every
//! verify/repair/attest cycle. Shape mirrors a `LogEntry`/`LogEmitter`
//! contract: required core fields, optional context fields, one JSON
//! object per line.
//!
//! Append-only is enforced beyond "there is no rewind method": each record
//! also carries a running hash over the chain so far
//! (`chain_hash = oracle(prev_chain_hash ++ record_bytes)`), and
//! [`is_prefix_stable`] lets a reader confirm that one snapshot of the log
//! is a strict extension of an earlier one rather than a rewrite.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ochrance_oracle::{oracle, Digest, HashAlgorithm};

/// The operation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Verify,
    Repair,
    Attest,
}

/// Outcome of the recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Ok,
    Failed,
}

/// One append-only `@audit` record.
///
/// Required: `timestamp`, `action`, `outcome`, `chain_hash`. Optional
/// context fields cover the operation's subject and, on failure, the
/// diagnostic rendered as a single line. `chain_hash` is never set by a
/// caller directly — [`AuditEmitter::emit`] stamps it in as the record is
/// appended, over every other field's content plus the chain hash that
/// preceded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks_restored: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(default)]
    pub chain_hash: String,
}

impl AuditRecord {
    #[must_use]
    pub fn new(timestamp: impl Into<String>, action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            timestamp: timestamp.into(),
            action,
            outcome,
            mode: None,
            subsystem: None,
            blocks_restored: None,
            diagnostic: None,
            chain_hash: String::new(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    #[must_use]
    pub fn with_blocks_restored(mut self, blocks_restored: usize) -> Self {
        self.blocks_restored = Some(blocks_restored);
        self
    }

    #[must_use]
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Bytes the chain hash is computed over: every field except
    /// `chain_hash` itself, in a fixed order, so the hash cannot depend on
    /// its own output.
    fn content_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&(
            &self.timestamp,
            self.action,
            self.outcome,
            &self.mode,
            &self.subsystem,
            self.blocks_restored,
            &self.diagnostic,
        ))
        .expect("audit record content is always representable as JSON")
    }
}

const CHAIN_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Writes JSONL audit records to a file or in-memory buffer. Append-only:
/// there is no method that rewinds or truncates the underlying writer, and
/// every record it writes is chained to the one before it.
pub struct AuditEmitter {
    writer: Box<dyn Write>,
    chain_hash: Digest,
}

impl AuditEmitter {
    /// Open (or create) `path` for appending. The chain starts fresh from
    /// the genesis hash even if `path` already has prior entries; callers
    /// that need continuity across process restarts should read the file's
    /// last `chain_hash` back in and resume from there (not needed by this
    /// workspace's CLI, which runs one cycle per invocation).
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Box::new(std::io::BufWriter::new(file)),
            chain_hash: Digest::zero(CHAIN_ALGORITHM),
        })
    }

    /// Write to an in-memory buffer (for testing).
    #[must_use]
    pub fn to_buffer() -> Self {
        Self {
            writer: Box::new(Vec::new()),
            chain_hash: Digest::zero(CHAIN_ALGORITHM),
        }
    }

    /// Stamp `record.chain_hash` from the running chain and append it.
    pub fn emit(&mut self, record: &mut AuditRecord) -> std::io::Result<()> {
        let mut preimage = self.chain_hash.as_bytes().to_vec();
        preimage.extend_from_slice(&record.content_bytes());
        let next = oracle(CHAIN_ALGORITHM, &preimage);
        record.chain_hash = next.to_hex();
        self.chain_hash = next;

        let line = serde_json::to_string(record).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Recompute the chain over `records` from the genesis hash and confirm
/// every `chain_hash` matches — detects any record whose content or
/// ordering was altered after the fact.
#[must_use]
pub fn verify_chain(records: &[AuditRecord]) -> bool {
    let mut chain_hash = Digest::zero(CHAIN_ALGORITHM);
    for record in records {
        let mut preimage = chain_hash.as_bytes().to_vec();
        preimage.extend_from_slice(&record.content_bytes());
        chain_hash = oracle(CHAIN_ALGORITHM, &preimage);
        if chain_hash.to_hex() != record.chain_hash {
            return false;
        }
    }
    true
}

/// The append-only guarantee: an earlier read of the log must be a strict
/// prefix of a later one — every chain hash `older` recorded must reappear,
/// unchanged and in the same order, at the start of `newer`.
#[must_use]
pub fn is_prefix_stable(older: &[AuditRecord], newer: &[AuditRecord]) -> bool {
    older.len() <= newer.len() && older.iter().zip(newer).all(|(a, b)| a.chain_hash == b.chain_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_required_fields_only() {
        let record = AuditRecord::new("2026-07-28T00:00:00Z", AuditAction::Verify, AuditOutcome::Ok);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"action\":\"verify\""));
        assert!(!json.contains("\"mode\""));
    }

    #[test]
    fn emitter_writes_one_json_object_per_line() {
        let mut emitter = AuditEmitter::to_buffer();
        let mut first = AuditRecord::new("2026-07-28T00:00:00Z", AuditAction::Repair, AuditOutcome::Ok).with_blocks_restored(1);
        emitter.emit(&mut first).unwrap();
        let mut second =
            AuditRecord::new("2026-07-28T00:00:01Z", AuditAction::Verify, AuditOutcome::Failed).with_diagnostic("[ERROR] hash-mismatch");
        emitter.emit(&mut second).unwrap();
        emitter.flush().unwrap();
    }

    fn three_records() -> Vec<AuditRecord> {
        let mut emitter = AuditEmitter::to_buffer();
        let mut records = vec![
            AuditRecord::new("2026-07-28T00:00:00Z", AuditAction::Verify, AuditOutcome::Ok),
            AuditRecord::new("2026-07-28T00:00:01Z", AuditAction::Repair, AuditOutcome::Ok).with_blocks_restored(2),
            AuditRecord::new("2026-07-28T00:00:02Z", AuditAction::Verify, AuditOutcome::Ok),
        ];
        for record in &mut records {
            emitter.emit(record).unwrap();
        }
        records
    }

    #[test]
    fn emit_stamps_distinct_chain_hashes_in_sequence() {
        let records = three_records();
        assert!(!records[0].chain_hash.is_empty());
        assert_ne!(records[0].chain_hash, records[1].chain_hash);
        assert_ne!(records[1].chain_hash, records[2].chain_hash);
    }

    #[test]
    fn verify_chain_accepts_an_untampered_log() {
        assert!(verify_chain(&three_records()));
    }

    #[test]
    fn verify_chain_rejects_a_record_edited_after_emission() {
        let mut records = three_records();
        records[1].blocks_restored = Some(99);
        assert!(!verify_chain(&records));
    }

    #[test]
    fn verify_chain_rejects_reordered_records() {
        let mut records = three_records();
        records.swap(0, 1);
        assert!(!verify_chain(&records));
    }

    #[test]
    fn a_full_log_is_prefix_stable_against_its_own_earlier_snapshot() {
        let records = three_records();
        assert!(is_prefix_stable(&records[..1], &records));
        assert!(is_prefix_stable(&records[..2], &records));
        assert!(is_prefix_stable(&records, &records));
    }

    #[test]
    fn a_rewritten_prefix_is_not_prefix_stable() {
        let records = three_records();
        let mut rewritten = records.clone();
        rewritten[0].chain_hash = "tampered".to_owned();
        assert!(!is_prefix_stable(&records[..1], &rewritten));
    }

    #[test]
    fn a_shorter_log_cannot_be_newer_than_a_longer_one() {
        let records = three_records();
        assert!(!is_prefix_stable(&records, &records[..1]));
    }
}
