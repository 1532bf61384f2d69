//! Assembling and reading back the A2ML attestation document: the
//! `@manifest`/`@refs`/`@attestation`/`@policy`/`@audit` wiring the façade
//! treats as its persisted output.

use ochrance_a2ml::{Field, FieldValue, Manifest as A2mlManifest, Section, SectionTag, Value};
use ochrance_merkle::MerkleTree;
use ochrance_oracle::{oracle, Digest, HashAlgorithm};
use ochrance_verify::{AttestationMetadata, FsManifest, Witness, BLOCK_SIZE};

/// One `@policy` outcome summary: counters plus an optional violation list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicySummary {
    pub mode: String,
    pub passed: i64,
    pub failed: i64,
    pub skipped: i64,
    pub total_policies: i64,
    pub violations: Vec<String>,
}

/// One `@audit` entry: an append-only log line, strictly ordered by
/// timestamp. `chain_hash` links it to the entry before it — see
/// [`stamp_audit_chain`] — so a reader can tell a genuine extension of the
/// log from a rewritten one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: String,
    pub action: String,
    pub detail: String,
    pub chain_hash: String,
}

impl AuditEntry {
    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(self.timestamp.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.action.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.detail.as_bytes());
        bytes
    }
}

/// Stamp `entries[i].chain_hash = oracle(entries[i-1].chain_hash ||
/// content_bytes(entries[i]))`, starting from [`Digest::zero`]. Entries
/// already carrying a chain hash that folds in prior history (e.g. ones
/// that came from [`ochrance_harness::AuditEmitter`]) should not be
/// re-stamped — this is for assembling a fresh `@audit` section from
/// entries that don't yet have one.
pub fn stamp_audit_chain(entries: &mut [AuditEntry], algorithm: HashAlgorithm) {
    let mut chain_hash = Digest::zero(algorithm);
    for entry in entries {
        let mut preimage = chain_hash.as_bytes().to_vec();
        preimage.extend_from_slice(&entry.content_bytes());
        chain_hash = oracle(algorithm, &preimage);
        entry.chain_hash = chain_hash.to_hex();
    }
}

/// Everything a single verification/repair/attestation cycle produces,
/// before rendering to the A2ML wire form.
#[derive(Debug, Clone)]
pub struct AttestationDocument {
    pub id: String,
    pub producer: String,
    pub subsystem: String,
    pub produced_at: String,
    pub device: Option<String>,
    pub hostname: Option<String>,
    pub manifest: FsManifest,
    pub previous_root: Option<String>,
    pub chain_length: u64,
    pub witness: Option<Witness>,
    pub verified_at: Option<String>,
    pub duration_ms: Option<u64>,
    pub policy: Option<PolicySummary>,
    pub audit: Vec<AuditEntry>,
}

impl AttestationDocument {
    /// Render to the `ochrance-a2ml` AST, ready for
    /// [`ochrance_a2ml::serialize_document`].
    #[must_use]
    pub fn to_a2ml(&self) -> A2mlManifest {
        let mut sections = vec![self.manifest_section(), self.refs_section()];
        if let Some(section) = self.attestation_section() {
            sections.push(section);
        }
        if let Some(section) = self.policy_section() {
            sections.push(section);
        }
        if !self.audit.is_empty() {
            sections.push(self.audit_section());
        }
        A2mlManifest {
            version: ochrance_a2ml::WIRE_VERSION,
            sections,
        }
    }

    fn manifest_section(&self) -> Section {
        let mut fields = vec![
            str_field("id", &self.id),
            str_field("version", self.manifest.format_version()),
            str_field("producer", &self.producer),
            str_field("subsystem", &self.subsystem),
            timestamp_field("produced_at", &self.produced_at),
        ];
        if let Some(device) = &self.device {
            fields.push(str_field("device", device));
        }
        if let Some(hostname) = &self.hostname {
            fields.push(str_field("hostname", hostname));
        }
        Section {
            tag: SectionTag::Manifest,
            fields,
        }
    }

    fn refs_section(&self) -> Section {
        let tree = MerkleTree::build(self.manifest.algorithm(), self.manifest.block_digests());
        let mut fields = vec![
            ident_field("algorithm", self.manifest.algorithm().tag()),
            hash_field("merkle_root", &self.manifest.root_digest().to_hex()),
            integer_field("block_count", self.manifest.n() as i64),
            integer_field("tree_depth", tree.depth() as i64),
            integer_field("leaf_size", BLOCK_SIZE as i64),
            list_field(
                "block_digests",
                self.manifest.block_digests().iter().map(|d| Value::Hash(d.to_hex())).collect(),
            ),
        ];
        if let Some(previous_root) = &self.previous_root {
            fields.push(hash_field("previous_root", previous_root));
            fields.push(integer_field("chain_length", self.chain_length as i64));
        }
        Section {
            tag: SectionTag::Refs,
            fields,
        }
    }

    fn attestation_section(&self) -> Option<Section> {
        let witness = self.witness.as_ref()?;
        let mut fields = vec![ident_field("type", witness_tier_name(witness))];
        if let Witness::Attested { attestation, .. } = witness {
            fields.push(bool_field("invariant_satisfied", attestation.invariant_satisfied));
        }
        if let Some(verified_at) = &self.verified_at {
            fields.push(timestamp_field("verified_at", verified_at));
        }
        if let Some(duration_ms) = self.duration_ms {
            fields.push(integer_field("duration_ms", duration_ms as i64));
        }
        Some(Section {
            tag: SectionTag::Attestation,
            fields,
        })
    }

    fn policy_section(&self) -> Option<Section> {
        let policy = self.policy.as_ref()?;
        let fields = vec![
            ident_field("mode", &policy.mode),
            integer_field("passed", policy.passed),
            integer_field("failed", policy.failed),
            integer_field("skipped", policy.skipped),
            integer_field("total_policies", policy.total_policies),
            list_field(
                "violations",
                policy.violations.iter().map(|v| Value::Str(v.clone())).collect(),
            ),
        ];
        Some(Section {
            tag: SectionTag::Policy,
            fields,
        })
    }

    fn audit_section(&self) -> Section {
        let fields = self
            .audit
            .iter()
            .enumerate()
            .map(|(index, entry)| Field {
                key: format!("entry{index}"),
                value: FieldValue::Block(vec![
                    timestamp_field("timestamp", &entry.timestamp),
                    str_field("action", &entry.action),
                    str_field("detail", &entry.detail),
                    hash_field("chain_hash", &entry.chain_hash),
                ]),
            })
            .collect();
        Section {
            tag: SectionTag::Audit,
            fields,
        }
    }
}

fn witness_tier_name(witness: &Witness) -> &'static str {
    match witness {
        Witness::Structural => "structural",
        Witness::HashMatch { .. } => "hash-match",
        Witness::Attested { .. } => "attested",
    }
}

/// Build an [`AttestationMetadata`] for inclusion in a rendered document
/// after a successful Attested-tier verification.
#[must_use]
pub fn attestation_metadata(timestamp: impl Into<String>) -> AttestationMetadata {
    AttestationMetadata {
        timestamp: timestamp.into(),
        invariant_satisfied: true,
    }
}

/// Why [`manifest_from_refs`] could not reconstruct an [`FsManifest`] from a
/// parsed `@refs` section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentReadError {
    #[error("@refs section is missing")]
    MissingRefs,
    #[error("@refs.{field} is missing or has the wrong value kind")]
    MissingField { field: &'static str },
    #[error("@refs.algorithm {tag:?} is not one of the four supported algorithms")]
    UnknownAlgorithm { tag: String },
    #[error("@refs.merkle_root is not valid hex for its algorithm: {0}")]
    MalformedRoot(#[from] ochrance_oracle::DigestError),
    #[error("@refs.block_digests[{index}] is not valid hex for its algorithm")]
    MalformedBlockDigest { index: usize },
}

/// Reconstruct an [`FsManifest`] from a document's `@refs` section (the
/// inverse of [`AttestationDocument::refs_section`]). Requires the
/// `block_digests` list this crate adds to `@refs` alongside the root hash,
/// since the root alone isn't enough to rebuild the Merkle tree.
pub fn manifest_from_refs(rendered: &A2mlManifest, manifest_version: &str) -> Result<FsManifest, DocumentReadError> {
    let section = rendered
        .section(SectionTag::Refs)
        .ok_or(DocumentReadError::MissingRefs)?;

    let algorithm_tag = section
        .find("algorithm")
        .and_then(|f| f.value())
        .and_then(Value::as_str)
        .ok_or(DocumentReadError::MissingField { field: "algorithm" })?;
    let algorithm = HashAlgorithm::from_tag_loose(algorithm_tag).ok_or_else(|| DocumentReadError::UnknownAlgorithm {
        tag: algorithm_tag.to_owned(),
    })?;

    let root_hex = section
        .find("merkle_root")
        .and_then(|f| f.value())
        .and_then(Value::as_str)
        .ok_or(DocumentReadError::MissingField { field: "merkle_root" })?;
    let root_digest = ochrance_oracle::Digest::from_hex(algorithm, root_hex)?;

    let digest_values = section
        .find("block_digests")
        .and_then(|f| f.value())
        .and_then(Value::as_list)
        .ok_or(DocumentReadError::MissingField { field: "block_digests" })?;
    let mut block_digests = Vec::with_capacity(digest_values.len());
    for (index, value) in digest_values.iter().enumerate() {
        let hex = value
            .as_str()
            .ok_or(DocumentReadError::MalformedBlockDigest { index })?;
        block_digests.push(
            ochrance_oracle::Digest::from_hex(algorithm, hex)
                .map_err(|_| DocumentReadError::MalformedBlockDigest { index })?,
        );
    }

    Ok(FsManifest::from_parts(algorithm, root_digest, block_digests, manifest_version))
}

fn str_field(key: &str, value: &str) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Str(value.to_owned())),
    }
}

fn ident_field(key: &str, value: &str) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Ident(value.to_owned())),
    }
}

fn hash_field(key: &str, hex: &str) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Hash(hex.to_owned())),
    }
}

fn timestamp_field(key: &str, value: &str) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Timestamp(value.to_owned())),
    }
}

fn integer_field(key: &str, value: i64) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Integer(value)),
    }
}

fn bool_field(key: &str, value: bool) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::Bool(value)),
    }
}

fn list_field(key: &str, values: Vec<Value>) -> Field {
    Field {
        key: key.to_owned(),
        value: FieldValue::Value(Value::List(values)),
    }
}

/// Unknown hash algorithm tag error re-exported for callers reading back
/// a manifest's `@refs.algorithm` field.
#[must_use]
pub fn parse_algorithm(tag: &str) -> Option<HashAlgorithm> {
    HashAlgorithm::from_tag_loose(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ochrance_oracle::{oracle, HashAlgorithm};

    fn manifest() -> FsManifest {
        let digests = vec![oracle(HashAlgorithm::Sha256, b"a"), oracle(HashAlgorithm::Sha256, b"b")];
        FsManifest::build(HashAlgorithm::Sha256, digests, "1")
    }

    #[test]
    fn renders_required_sections() {
        let doc = AttestationDocument {
            id: "m-1".into(),
            producer: "ochrance".into(),
            subsystem: "fs0".into(),
            produced_at: "2026-07-28T00:00:00Z".into(),
            device: None,
            hostname: None,
            manifest: manifest(),
            previous_root: None,
            chain_length: 0,
            witness: None,
            verified_at: None,
            duration_ms: None,
            policy: None,
            audit: Vec::new(),
        };
        let rendered = doc.to_a2ml();
        assert!(rendered.section(SectionTag::Manifest).is_some());
        assert!(rendered.section(SectionTag::Refs).is_some());
        assert!(rendered.section(SectionTag::Attestation).is_none());
    }

    #[test]
    fn round_trips_through_the_wire_format_and_validates() {
        let doc = AttestationDocument {
            id: "m-1".into(),
            producer: "ochrance".into(),
            subsystem: "fs0".into(),
            produced_at: "2026-07-28T00:00:00Z".into(),
            device: Some("/dev/fs0".into()),
            hostname: Some("host-a".into()),
            manifest: manifest(),
            previous_root: None,
            chain_length: 0,
            witness: Some(Witness::Attested {
                evidence: Vec::new(),
                attestation: attestation_metadata("2026-07-28T00:00:01Z"),
            }),
            verified_at: Some("2026-07-28T00:00:01Z".into()),
            duration_ms: Some(12),
            policy: Some(PolicySummary {
                mode: "attested".into(),
                passed: 2,
                failed: 0,
                skipped: 0,
                total_policies: 2,
                violations: Vec::new(),
            }),
            audit: {
                let mut entries = vec![AuditEntry {
                    timestamp: "2026-07-28T00:00:01Z".into(),
                    action: "verify".into(),
                    detail: "attested ok".into(),
                    chain_hash: String::new(),
                }];
                stamp_audit_chain(&mut entries, HashAlgorithm::Sha256);
                entries
            },
        };

        let rendered = ochrance_a2ml::serialize_document(&doc.to_a2ml());
        let parsed = ochrance_a2ml::parse_document(&rendered).unwrap();
        assert!(ochrance_a2ml::validate::validate(&parsed).is_ok());
    }

    #[test]
    fn manifest_from_refs_reconstructs_the_original_manifest() {
        let original = manifest();
        let doc = AttestationDocument {
            id: "m-1".into(),
            producer: "ochrance".into(),
            subsystem: "fs0".into(),
            produced_at: "2026-07-28T00:00:00Z".into(),
            device: None,
            hostname: None,
            manifest: original.clone(),
            previous_root: None,
            chain_length: 0,
            witness: None,
            verified_at: None,
            duration_ms: None,
            policy: None,
            audit: Vec::new(),
        };

        let rendered = doc.to_a2ml();
        let reconstructed = manifest_from_refs(&rendered, original.format_version()).unwrap();
        assert_eq!(reconstructed.root_digest(), original.root_digest());
        assert_eq!(reconstructed.block_digests(), original.block_digests());
        assert_eq!(reconstructed.algorithm(), original.algorithm());
    }

    #[test]
    fn manifest_from_refs_rejects_a_document_with_no_refs_section() {
        let rendered = A2mlManifest {
            version: ochrance_a2ml::WIRE_VERSION,
            sections: Vec::new(),
        };
        let err = manifest_from_refs(&rendered, "1").unwrap_err();
        assert!(matches!(err, DocumentReadError::MissingRefs));
    }

    #[test]
    fn stamp_audit_chain_links_each_entry_to_the_one_before_it() {
        let mut entries = vec![
            AuditEntry {
                timestamp: "2026-07-28T00:00:00Z".into(),
                action: "verify".into(),
                detail: "ok".into(),
                chain_hash: String::new(),
            },
            AuditEntry {
                timestamp: "2026-07-28T00:00:01Z".into(),
                action: "repair".into(),
                detail: "restored block 3".into(),
                chain_hash: String::new(),
            },
        ];
        stamp_audit_chain(&mut entries, HashAlgorithm::Sha256);

        assert!(!entries[0].chain_hash.is_empty());
        assert_ne!(entries[0].chain_hash, entries[1].chain_hash);

        let mut replayed = entries.clone();
        for entry in &mut replayed {
            entry.chain_hash.clear();
        }
        stamp_audit_chain(&mut replayed, HashAlgorithm::Sha256);
        assert_eq!(replayed, entries);

        let mut tampered = entries.clone();
        tampered[0].detail = "tampered".into();
        stamp_audit_chain(&mut tampered, HashAlgorithm::Sha256);
        assert_ne!(tampered[1].chain_hash, entries[1].chain_hash);
    }
}
