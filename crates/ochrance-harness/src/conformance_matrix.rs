//! Table-driven registry covering the workspace's end-to-end conformance
//! scenarios. Each scenario is a self-contained fixture plus an assertion
//! closure; [`run_all`] executes every one and reports pass/fail without
//! stopping at the first failure, mirroring the validator's own
//! batch-accumulation discipline.

use ochrance_a2ml::{parser, ParseError};
use ochrance_diagnostic::{Query, Zone};
use ochrance_oracle::HashAlgorithm;
use ochrance_repair::{repair, EphapaxToken, RepairAction, RepairResult, Snapshot};
use ochrance_verify::{verify, Block, BlockMetadata, FsManifest, FsState, Tier, VerificationMode};

/// Outcome of a single scenario: whether its assertions held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed { detail: String },
}

/// One scenario's name plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub outcome: ScenarioOutcome,
}

fn pass(name: &'static str) -> ScenarioReport {
    ScenarioReport {
        name,
        outcome: ScenarioOutcome::Passed,
    }
}

fn fail(name: &'static str, detail: impl Into<String>) -> ScenarioReport {
    ScenarioReport {
        name,
        outcome: ScenarioOutcome::Failed { detail: detail.into() },
    }
}

fn fixture(n: usize) -> (FsState, FsManifest, Vec<Block>, Vec<BlockMetadata>) {
    let blocks: Vec<Block> = (0..n)
        .map(|_| Block::new(HashAlgorithm::Sha256, vec![0u8; ochrance_verify::BLOCK_SIZE]))
        .collect();
    let metadata: Vec<BlockMetadata> = (0..n)
        .map(|_| BlockMetadata::new("2026-07-28T00:00:00Z", "root", false))
        .collect();
    let digests = blocks.iter().map(|b| b.leaf_digest().clone()).collect();
    let manifest = FsManifest::build(HashAlgorithm::Sha256, digests, "1");
    let state = FsState::new(blocks.clone(), metadata.clone()).unwrap();
    (state, manifest, blocks, metadata)
}

/// Scenario 1: happy path, Attested — four constant-zero blocks verify
/// Attested with no diagnostics.
fn scenario_happy_path_attested() -> ScenarioReport {
    let (state, manifest, ..) = fixture(4);
    match verify(VerificationMode::Attested, &state, &manifest) {
        Ok(witness) if witness.tier() == Tier::Attested => pass("happy-path-attested"),
        Ok(witness) => fail("happy-path-attested", format!("expected Attested tier, got {:?}", witness.tier())),
        Err(diagnostic) => fail("happy-path-attested", diagnostic.render_line()),
    }
}

/// Scenario 2: single-bit flip — flipping one byte of block 2 fails
/// Checked with a `hash-mismatch` on `blocks` zoned at `block:2`.
fn scenario_single_bit_flip() -> ScenarioReport {
    let (mut state, manifest, ..) = fixture(4);
    flip_block(&mut state, 2);

    match verify(VerificationMode::Checked, &state, &manifest) {
        Err(diagnostic) => {
            let cause_ok = matches!(&diagnostic.query, Query::HashMismatch { field, .. } if field == "blocks");
            let zone_ok = diagnostic.zone == Zone::single_block("2");
            if cause_ok && zone_ok {
                pass("single-bit-flip")
            } else {
                fail("single-bit-flip", diagnostic.render_line())
            }
        }
        Ok(_) => fail("single-bit-flip", "expected Checked verification to fail"),
    }
}

/// Scenario 3: Merkle-root tamper — an inverted root fails only at
/// Attested, not at Checked, and is fatal (no remediation applies).
fn scenario_merkle_root_tamper() -> ScenarioReport {
    let (state, manifest, ..) = fixture(4);
    let inverted_bytes: Vec<u8> = manifest.root_digest().as_bytes().iter().map(|b| !b).collect();
    let inverted = ochrance_oracle::Digest::from_hex(HashAlgorithm::Sha256, &hex::encode(inverted_bytes)).unwrap();
    let tampered = FsManifest::from_parts(
        HashAlgorithm::Sha256,
        inverted,
        manifest.block_digests().to_vec(),
        manifest.format_version().to_owned(),
    );

    if verify(VerificationMode::Checked, &state, &tampered).is_err() {
        return fail("merkle-root-tamper", "Checked unexpectedly failed before Attested was tried");
    }

    match verify(VerificationMode::Attested, &state, &tampered) {
        Err(diagnostic) => match &diagnostic.query {
            Query::HashMismatch { field, .. } if field == "merkle-root" => pass("merkle-root-tamper"),
            _ => fail("merkle-root-tamper", diagnostic.render_line()),
        },
        Ok(_) => fail("merkle-root-tamper", "expected Attested verification to fail"),
    }
}

/// Scenario 4: repair round-trip — scenario 2's corruption, repaired with a
/// snapshot of the original block 2, re-verifies Attested-OK.
fn scenario_repair_round_trip() -> ScenarioReport {
    let (mut state, manifest, blocks, metadata) = fixture(4);
    let snapshot = Snapshot::capture("snap-rt", "2026-07-28T00:00:00Z", &blocks, &metadata);
    flip_block(&mut state, 2);

    let token = EphapaxToken::issue(RepairAction::RestoreBlock(2));
    let result = repair(&mut state, &manifest, &snapshot, token, VerificationMode::Attested);
    match result {
        RepairResult::RepairOk { blocks_restored: 1 } => match verify(VerificationMode::Attested, &state, &manifest) {
            Ok(witness) if witness.tier() == Tier::Attested => pass("repair-round-trip"),
            Ok(witness) => fail("repair-round-trip", format!("expected Attested tier after repair, got {:?}", witness.tier())),
            Err(diagnostic) => fail("repair-round-trip", diagnostic.render_line()),
        },
        RepairResult::RepairOk { blocks_restored } => fail("repair-round-trip", format!("expected 1 block restored, got {blocks_restored}")),
        RepairResult::RepairFailed { reason } => fail("repair-round-trip", reason.render_line()),
    }
}

/// Scenario 5: malformed manifest — a document missing `@manifest` fails
/// with `missing-required("manifest")`.
fn scenario_malformed_manifest() -> ScenarioReport {
    let tokens = ochrance_a2ml::lexer::tokenize("@refs {\n  algorithm: sha256\n}\n").unwrap();
    match parser::parse(&tokens) {
        Err(ParseError::MissingRequired { name }) if name == "manifest" => pass("malformed-manifest"),
        Err(other) => fail("malformed-manifest", other.to_string()),
        Ok(_) => fail("malformed-manifest", "expected parse to fail"),
    }
}

/// Scenario 6: duplicate section — two `@refs` sections fails with
/// `duplicate-section("refs")` at the second occurrence.
fn scenario_duplicate_section() -> ScenarioReport {
    let source = "@manifest {\n  id: \"m\"\n}\n@refs {\n  algorithm: sha256\n}\n@refs {\n  algorithm: sha256\n}\n";
    let tokens = ochrance_a2ml::lexer::tokenize(source).unwrap();
    match parser::parse(&tokens) {
        Err(ParseError::DuplicateSection { name, .. }) if name == "refs" => pass("duplicate-section"),
        Err(other) => fail("duplicate-section", other.to_string()),
        Ok(_) => fail("duplicate-section", "expected parse to fail"),
    }
}

/// Scenario 7: nesting attack — nine levels of nested blocks fails with
/// `nesting-exceeded` before any further work is attempted.
fn scenario_nesting_attack() -> ScenarioReport {
    let mut source = String::from("@manifest {\n  id: \"m\"\n");
    for _ in 0..9 {
        source.push_str("  nest {\n");
    }
    source.push_str("  leaf: \"v\"\n");
    for _ in 0..9 {
        source.push_str("  }\n");
    }
    source.push_str("}\n");

    let tokens = ochrance_a2ml::lexer::tokenize(&source).unwrap();
    match parser::parse(&tokens) {
        Err(ParseError::NestingExceeded { limit, .. }) if limit == ochrance_a2ml::parser::MAX_NESTING_DEPTH => pass("nesting-attack"),
        Err(other) => fail("nesting-attack", other.to_string()),
        Ok(_) => fail("nesting-attack", "expected parse to fail with nesting-exceeded"),
    }
}

/// Scenario 8: Lax passes where Checked fails — scenario 2's corrupted
/// state still verifies Structural under Lax.
fn scenario_lax_passes_where_checked_fails() -> ScenarioReport {
    let (mut state, manifest, ..) = fixture(4);
    flip_block(&mut state, 2);

    match verify(VerificationMode::Lax, &state, &manifest) {
        Ok(witness) if witness.tier() == Tier::Structural => pass("lax-passes-where-checked-fails"),
        Ok(witness) => fail("lax-passes-where-checked-fails", format!("expected Structural tier, got {:?}", witness.tier())),
        Err(diagnostic) => fail("lax-passes-where-checked-fails", diagnostic.render_line()),
    }
}

fn flip_block(state: &mut FsState, index: usize) {
    let mut bytes = state.blocks()[index].raw_bytes().to_vec();
    bytes[0] ^= 0x01;
    state
        .replace_block(index, Block::new(HashAlgorithm::Sha256, bytes), BlockMetadata::new("t", "root", false))
        .unwrap();
}

/// Run every registered scenario, in order. Does not short-circuit on the
/// first failure — the caller sees the full table.
#[must_use]
pub fn run_all() -> Vec<ScenarioReport> {
    vec![
        scenario_happy_path_attested(),
        scenario_single_bit_flip(),
        scenario_merkle_root_tamper(),
        scenario_repair_round_trip(),
        scenario_malformed_manifest(),
        scenario_duplicate_section(),
        scenario_nesting_attack(),
        scenario_lax_passes_where_checked_fails(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes() {
        let reports = run_all();
        for report in &reports {
            assert_eq!(report.outcome, ScenarioOutcome::Passed, "scenario {} failed: {:?}", report.name, report.outcome);
        }
        assert_eq!(reports.len(), 8);
    }
}
