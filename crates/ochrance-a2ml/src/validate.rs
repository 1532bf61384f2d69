use ochrance_oracle::HashAlgorithm;

use crate::ast::{Field, FieldValue, Manifest, Value};
use crate::token::SectionTag;

const POLICY_MODES: [&str; 3] = ["lax", "checked", "attested"];

/// One failing invariant. The validator accumulates these in a batch
/// rather than failing fast on the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("@{section} is required but missing")]
    MissingSection { section: &'static str },
    #[error("@{section}.{field} is required and must be non-empty")]
    MissingOrEmptyField { section: &'static str, field: &'static str },
    #[error("@manifest.produced_at {value:?} does not parse as ISO-8601 with trailing Z")]
    BadTimestamp { value: String },
    #[error("hash literal at {path} has hex length {actual_bytes} bytes, expected {expected_bytes} for {algorithm}")]
    HashLengthMismatch {
        path: String,
        algorithm: HashAlgorithm,
        expected_bytes: usize,
        actual_bytes: usize,
    },
    #[error("hash literal at {path} cannot be validated: no known digest algorithm")]
    UnresolvableHashAlgorithm { path: String },
    #[error("@refs.algorithm {tag:?} is not one of the four supported algorithms")]
    UnknownAlgorithm { tag: String },
    #[error("@refs.block_count must be non-negative, got {value}")]
    NegativeBlockCount { value: i64 },
    #[error("@refs.tree_depth {actual} is inconsistent with block_count {block_count} (expected {expected})")]
    TreeDepthMismatch {
        block_count: u64,
        expected: u32,
        actual: u32,
    },
    #[error("@policy counters disagree: passed({passed}) + failed({failed}) + skipped({skipped}) != total_policies({total})")]
    PolicyCountMismatch {
        passed: i64,
        failed: i64,
        skipped: i64,
        total: i64,
    },
    #[error("@policy.violations has {violations} entries, exceeding failed({failed})")]
    ViolationCountExceedsFailed { violations: usize, failed: i64 },
    #[error("@policy.mode {mode:?} is not one of {lax_checked_attested:?}")]
    UnknownPolicyMode {
        mode: String,
        lax_checked_attested: [&'static str; 3],
    },
    #[error("@audit entry {index} timestamp {actual:?} precedes entry {prev_index}'s {previous:?}")]
    AuditTimestampNotMonotonic {
        index: usize,
        prev_index: usize,
        previous: String,
        actual: String,
    },
}

/// Validate every invariant the wire format requires, returning every
/// failure at once rather than stopping at the first.
pub fn validate(manifest: &Manifest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_manifest_section(manifest, &mut errors);
    let algorithm = validate_refs_section(manifest, &mut errors);
    validate_policy_section(manifest, &mut errors);
    validate_audit_section(manifest, &mut errors);

    validate_hash_literals(manifest, algorithm, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn non_empty_str(fields: &[Field], key: &str) -> Option<&str> {
    crate::ast::find(fields, key)
        .and_then(|f| f.value())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn validate_manifest_section(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let Some(section) = manifest.section(SectionTag::Manifest) else {
        errors.push(ValidationError::MissingSection { section: "manifest" });
        return;
    };

    for field in ["id", "version", "producer", "subsystem", "produced_at"] {
        if non_empty_str(&section.fields, field).is_none() {
            errors.push(ValidationError::MissingOrEmptyField {
                section: "manifest",
                field,
            });
        }
    }

    if let Some(produced_at) = non_empty_str(&section.fields, "produced_at") {
        if !is_iso8601_z(produced_at) {
            errors.push(ValidationError::BadTimestamp {
                value: produced_at.to_owned(),
            });
        }
    }
}

fn validate_refs_section(manifest: &Manifest, errors: &mut Vec<ValidationError>) -> Option<HashAlgorithm> {
    let section = manifest.section(SectionTag::Refs)?;

    let algorithm = non_empty_str(&section.fields, "algorithm").and_then(|tag| {
        let parsed = HashAlgorithm::from_tag_loose(tag);
        if parsed.is_none() {
            errors.push(ValidationError::UnknownAlgorithm { tag: tag.to_owned() });
        }
        parsed
    });

    if section.find("merkle_root").is_none() {
        errors.push(ValidationError::MissingOrEmptyField {
            section: "refs",
            field: "merkle_root",
        });
    }

    let block_count = section
        .find("block_count")
        .and_then(|f| f.value())
        .and_then(Value::as_integer);
    if let Some(n) = block_count {
        if n < 0 {
            errors.push(ValidationError::NegativeBlockCount { value: n });
        } else if let Some(depth) = section
            .find("tree_depth")
            .and_then(|f| f.value())
            .and_then(Value::as_integer)
        {
            let expected = expected_tree_depth(n as u64);
            if depth < 0 || depth as u32 != expected {
                errors.push(ValidationError::TreeDepthMismatch {
                    block_count: n as u64,
                    expected,
                    actual: depth.max(0) as u32,
                });
            }
        }
    }

    algorithm
}

fn validate_policy_section(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let Some(section) = manifest.section(SectionTag::Policy) else {
        return;
    };

    let get_int = |key: &str| section.find(key).and_then(|f| f.value()).and_then(Value::as_integer);
    if let (Some(passed), Some(failed), Some(skipped), Some(total)) = (
        get_int("passed"),
        get_int("failed"),
        get_int("skipped"),
        get_int("total_policies"),
    ) {
        if passed + failed + skipped != total {
            errors.push(ValidationError::PolicyCountMismatch {
                passed,
                failed,
                skipped,
                total,
            });
        }

        if let Some(violations) = section.find("violations").and_then(|f| f.value()).and_then(Value::as_list) {
            if violations.len() as i64 > failed {
                errors.push(ValidationError::ViolationCountExceedsFailed {
                    violations: violations.len(),
                    failed,
                });
            }
        }
    }

    if let Some(mode) = non_empty_str(&section.fields, "mode") {
        if !POLICY_MODES.contains(&mode) {
            errors.push(ValidationError::UnknownPolicyMode {
                mode: mode.to_owned(),
                lax_checked_attested: POLICY_MODES,
            });
        }
    }
}

fn validate_audit_section(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let Some(section) = manifest.section(SectionTag::Audit) else {
        return;
    };

    let mut prev: Option<(usize, String)> = None;
    for (index, field) in section.fields.iter().enumerate() {
        let Some(entry_fields) = field.block() else {
            continue;
        };
        let Some(ts) = non_empty_str(entry_fields, "timestamp") else {
            continue;
        };
        if let Some((prev_index, prev_ts)) = &prev {
            if ts < prev_ts.as_str() {
                errors.push(ValidationError::AuditTimestampNotMonotonic {
                    index,
                    prev_index: *prev_index,
                    previous: prev_ts.clone(),
                    actual: ts.to_owned(),
                });
            }
        }
        prev = Some((index, ts.to_owned()));
    }
}

fn validate_hash_literals(manifest: &Manifest, algorithm: Option<HashAlgorithm>, errors: &mut Vec<ValidationError>) {
    for section in &manifest.sections {
        walk_fields(section.tag.keyword(), &section.fields, algorithm, errors);
    }
}

fn walk_fields(path: &str, fields: &[Field], algorithm: Option<HashAlgorithm>, errors: &mut Vec<ValidationError>) {
    for field in fields {
        let field_path = format!("{path}.{}", field.key);
        match &field.value {
            FieldValue::Value(Value::Hash(hex)) => match algorithm {
                Some(algorithm) => {
                    let actual_bytes = hex.len() / 2 + hex.len() % 2;
                    let decoded_len = hex::decode(hex).map(|b| b.len());
                    let actual_bytes = decoded_len.unwrap_or(actual_bytes);
                    if actual_bytes != algorithm.digest_len() {
                        errors.push(ValidationError::HashLengthMismatch {
                            path: field_path,
                            algorithm,
                            expected_bytes: algorithm.digest_len(),
                            actual_bytes,
                        });
                    }
                }
                None => errors.push(ValidationError::UnresolvableHashAlgorithm { path: field_path }),
            },
            FieldValue::Block(nested) => walk_fields(&field_path, nested, algorithm, errors),
            FieldValue::Value(_) => {}
        }
    }
}

fn is_iso8601_z(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 20
        && s.ends_with('Z')
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[13] == b':'
        && bytes[16] == b':'
}

/// Duplicated-last-promotion tree depth for `n` leaves (mirrors
/// `ochrance_merkle`'s level-reduction rule, reimplemented here without a
/// crate dependency since validation only needs the depth count, not actual
/// hashing).
fn expected_tree_depth(n: u64) -> u32 {
    if n <= 1 {
        return 0;
    }
    let mut count = n;
    let mut depth = 0u32;
    while count > 1 {
        count = count / 2 + count % 2;
        depth += 1;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn parse_src(src: &str) -> Manifest {
        parse(&tokenize(src).unwrap()).unwrap()
    }

    #[test]
    fn accepts_well_formed_manifest() {
        let m = parse_src(
            r#"@manifest {
                id: "m-1"
                version: "1"
                producer: "ochrance"
                subsystem: "fs0"
                produced_at: "2026-07-28T00:00:00Z"
            }
            @refs {
                algorithm: sha256
                merkle_root: #aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa
                block_count: 1
                tree_depth: 0
            }"#,
        );
        assert!(validate(&m).is_ok(), "unexpected errors: {:?}", validate(&m));
    }

    #[test]
    fn rejects_missing_manifest_fields() {
        let m = parse_src(r#"@manifest { id: "m-1" }"#);
        let errors = validate(&m).unwrap_err();
        assert!(errors.len() >= 4, "expected multiple accumulated errors, got {errors:?}");
    }

    #[test]
    fn rejects_bad_timestamp() {
        let m = parse_src(
            r#"@manifest {
                id: "m-1"
                version: "1"
                producer: "p"
                subsystem: "s"
                produced_at: "not-a-date"
            }"#,
        );
        let errors = validate(&m).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::BadTimestamp { .. })));
    }

    #[test]
    fn policy_count_mismatch_detected() {
        let m = parse_src(
            r#"@manifest { id: "m" version: "1" producer: "p" subsystem: "s" produced_at: "2026-07-28T00:00:00Z" }
            @policy {
                passed: 1
                failed: 1
                skipped: 1
                total_policies: 5
            }"#,
        );
        let errors = validate(&m).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::PolicyCountMismatch { .. })));
    }

    #[test]
    fn violation_count_exceeding_failed_detected() {
        let m = parse_src(
            r#"@manifest { id: "m" version: "1" producer: "p" subsystem: "s" produced_at: "2026-07-28T00:00:00Z" }
            @policy {
                passed: 1
                failed: 1
                skipped: 0
                total_policies: 2
                violations: [1 2]
            }"#,
        );
        let errors = validate(&m).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ViolationCountExceedsFailed { .. })));
    }

    #[test]
    fn audit_non_monotonic_timestamps_detected() {
        let m = parse_src(
            r#"@manifest { id: "m" version: "1" producer: "p" subsystem: "s" produced_at: "2026-07-28T00:00:00Z" }
            @audit {
                entry0 {
                    timestamp: "2026-07-28T01:00:00Z"
                }
                entry1 {
                    timestamp: "2026-07-28T00:00:00Z"
                }
            }"#,
        );
        let errors = validate(&m).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::AuditTimestampNotMonotonic { .. })));
    }

    #[test]
    fn tree_depth_inconsistency_detected() {
        let m = parse_src(
            r#"@manifest { id: "m" version: "1" producer: "p" subsystem: "s" produced_at: "2026-07-28T00:00:00Z" }
            @refs {
                algorithm: sha256
                merkle_root: #aa
                block_count: 5
                tree_depth: 1
            }"#,
        );
        let errors = validate(&m).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::TreeDepthMismatch { .. })));
    }
}
