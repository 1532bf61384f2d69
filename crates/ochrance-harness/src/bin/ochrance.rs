//! `ochrance` CLI: `attest` writes an A2ML manifest describing a path's
//! attestable state; `verify` evaluates a path against a previously written
//! manifest at a chosen strictness mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use ochrance::{
    manifest_from_refs, verify_or_repair_tracked, AttestationDocument, Block, BlockMetadata, Diagnostic, Filesystem,
    FsState, HashAlgorithm, Query, VerificationMode, VerifiedSubsystem,
};
use ochrance_harness::{AuditAction, AuditEmitter, AuditOutcome, AuditRecord};
use ochrance_repair::Snapshot;
use ochrance_verify::{Witness, BLOCK_SIZE};
use serde::Serialize;

/// Output rendering for harness CLI subcommands, matching the decode-report
/// pattern: `plain` for a human line, `json` for a structured report line.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[derive(Parser)]
#[command(name = "ochrance", about = "Filesystem integrity verification over a local path")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write an A2ML manifest describing the attestable state at `--path`.
    Attest {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "sha256")]
        algorithm: String,
        #[arg(long, default_value = "ochrance-cli")]
        producer: String,
        #[arg(long, default_value = "fs0")]
        subsystem: String,
        #[arg(long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
    /// Verify the filesystem at a manifest's declared device against the
    /// manifest, at the chosen strictness mode.
    Verify {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long, default_value = "lax")]
        mode: String,
        /// Path to read the current state from (overrides the manifest's
        /// recorded device/id, useful when re-verifying a relocated copy).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Path to a known-good snapshot source used to repair a single
        /// remediable failure before re-verifying.
        #[arg(long)]
        repair_snapshot: Option<PathBuf>,
        /// Append an `@audit`-shaped JSONL record of this run.
        #[arg(long)]
        audit_log: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Attest {
            path,
            output,
            algorithm,
            producer,
            subsystem,
            format,
        } => run_attest(&path, &output, &algorithm, &producer, &subsystem, format),
        Command::Verify {
            manifest,
            mode,
            path,
            repair_snapshot,
            audit_log,
            format,
        } => run_verify(
            &manifest,
            &mode,
            path.as_deref(),
            repair_snapshot.as_deref(),
            audit_log.as_deref(),
            format,
        ),
    }
}

fn run_attest(path: &Path, output: &Path, algorithm: &str, producer: &str, subsystem: &str, format: OutputFormat) -> ExitCode {
    let Some(algorithm) = HashAlgorithm::from_tag_loose(algorithm) else {
        eprintln!("usage error: unknown hash algorithm {algorithm:?}");
        return ExitCode::from(64);
    };

    let state = match read_state(path, algorithm) {
        Ok(state) => state,
        Err(detail) => {
            eprintln!("[ERROR] io-failure: {detail} | subsystem:{subsystem}");
            return ExitCode::from(70);
        }
    };

    let subsystem_impl = Filesystem;
    let manifest = subsystem_impl.attest(&state, algorithm, "1");

    let doc = AttestationDocument {
        id: format!("{subsystem}-{}", now_utc()),
        producer: producer.to_owned(),
        subsystem: subsystem.to_owned(),
        produced_at: now_utc(),
        device: Some(path.display().to_string()),
        hostname: std::env::var("HOSTNAME").ok(),
        manifest,
        previous_root: None,
        chain_length: 0,
        witness: None,
        verified_at: None,
        duration_ms: None,
        policy: None,
        audit: Vec::new(),
    };

    let rendered = ochrance_a2ml::serialize_document(&doc.to_a2ml());
    if let Err(err) = fs::write(output, rendered) {
        eprintln!("[ERROR] io-failure: {err} | subsystem:{subsystem}");
        return ExitCode::from(70);
    }

    emit_report(
        format,
        false,
        &format!("attested {} blocks at {} -> {}", state.n(), path.display(), output.display()),
        &AttestReport {
            id: doc.id,
            blocks: state.n(),
            path: path.display().to_string(),
            output: output.display().to_string(),
        },
    );
    ExitCode::SUCCESS
}

#[derive(Serialize)]
struct AttestReport {
    id: String,
    blocks: usize,
    path: String,
    output: String,
}

fn run_verify(
    manifest_path: &Path,
    mode: &str,
    override_path: Option<&Path>,
    repair_snapshot: Option<&Path>,
    audit_log: Option<&Path>,
    format: OutputFormat,
) -> ExitCode {
    let mode = VerificationMode::from_str_loose(mode);

    let source = match fs::read_to_string(manifest_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("usage error: cannot read manifest {}: {err}", manifest_path.display());
            return ExitCode::from(64);
        }
    };

    let parsed = match ochrance_a2ml::parse_document(&source) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[ERROR] parse-failure: {err}");
            return ExitCode::from(2);
        }
    };

    if let Err(errors) = ochrance_a2ml::validate::validate(&parsed) {
        for error in &errors {
            eprintln!("[ERROR] invariant-violation: {error}");
        }
        return ExitCode::from(2);
    }

    let format_version = parsed
        .section(ochrance_a2ml::SectionTag::Manifest)
        .and_then(|s| s.find("version"))
        .and_then(|f| f.value())
        .and_then(ochrance_a2ml::Value::as_str)
        .unwrap_or("1")
        .to_owned();

    let manifest = match manifest_from_refs(&parsed, &format_version) {
        Ok(manifest) => manifest,
        Err(err) => {
            eprintln!("[ERROR] invariant-violation: {err}");
            return ExitCode::from(2);
        }
    };

    let device = override_path
        .map(Path::to_path_buf)
        .or_else(|| {
            parsed
                .section(ochrance_a2ml::SectionTag::Manifest)
                .and_then(|s| s.find("device"))
                .and_then(|f| f.value())
                .and_then(ochrance_a2ml::Value::as_str)
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| manifest_path.to_path_buf());

    let mut state = match read_state(&device, manifest.algorithm()) {
        Ok(state) => state,
        Err(detail) => {
            eprintln!("[ERROR] io-failure: {detail} | subsystem:filesystem");
            return ExitCode::from(70);
        }
    };

    let mut emitter = audit_log.map(AuditEmitter::to_file).transpose();
    let emitter = match &mut emitter {
        Ok(emitter) => emitter.as_mut(),
        Err(err) => {
            eprintln!("usage error: cannot open audit log: {err}");
            return ExitCode::from(64);
        }
    };

    let (result, repair_attempted) = if let Some(snapshot_path) = repair_snapshot {
        let snapshot = match build_snapshot(snapshot_path, manifest.algorithm()) {
            Ok(snapshot) => snapshot,
            Err(detail) => {
                eprintln!("[ERROR] io-failure: {detail} | subsystem:filesystem");
                return ExitCode::from(70);
            }
        };
        let subsystem_impl = Filesystem;
        verify_or_repair_tracked(&subsystem_impl, &mut state, &manifest, &snapshot, mode)
    } else {
        (Filesystem.verify(mode, &state, &manifest), false)
    };

    match result {
        Ok(witness) => {
            if let Some(emitter) = emitter {
                let mut record = AuditRecord::new(now_utc(), AuditAction::Verify, AuditOutcome::Ok).with_mode(mode.as_str());
                let _ = emitter.emit(&mut record);
                let _ = emitter.flush();
            }
            emit_report(
                format,
                false,
                &format!("OK ({:?} tier)", witness.tier()),
                &VerifyReport {
                    outcome: "ok",
                    mode: mode.as_str().to_owned(),
                    witness: Some(witness),
                    diagnostic: None,
                },
            );
            ExitCode::SUCCESS
        }
        Err(diagnostic) => {
            if let Some(emitter) = emitter {
                let mut record = AuditRecord::new(now_utc(), AuditAction::Verify, AuditOutcome::Failed)
                    .with_mode(mode.as_str())
                    .with_diagnostic(diagnostic.render_line());
                let _ = emitter.emit(&mut record);
                let _ = emitter.flush();
            }
            let exit_code = exit_code_for(&diagnostic, repair_attempted);
            emit_report(
                format,
                true,
                &diagnostic.render_line(),
                &VerifyReport {
                    outcome: "failed",
                    mode: mode.as_str().to_owned(),
                    witness: None,
                    diagnostic: Some(diagnostic),
                },
            );
            ExitCode::from(exit_code)
        }
    }
}

#[derive(Serialize)]
struct VerifyReport {
    outcome: &'static str,
    mode: String,
    witness: Option<Witness>,
    diagnostic: Option<Diagnostic>,
}

/// Render a subcommand's outcome per `--format`: `plain` writes a human line
/// to stdout (or stderr when `is_error`, matching prior CLI behavior), `json`
/// always writes the structured report to stdout so CI can parse the last
/// line regardless of outcome.
fn emit_report<T: Serialize>(format: OutputFormat, is_error: bool, plain_line: &str, report: &T) {
    match format {
        OutputFormat::Plain if is_error => eprintln!("{plain_line}"),
        OutputFormat::Plain => println!("{plain_line}"),
        OutputFormat::Json => match serde_json::to_string(report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("[ERROR] report-serialization-failure: {err}"),
        },
    }
}

fn exit_code_for(diagnostic: &Diagnostic, repair_attempted: bool) -> u8 {
    if repair_attempted {
        return 5;
    }
    match &diagnostic.query {
        Query::HashMismatch { field, .. } if field == "merkle-root" => 4,
        Query::MissingStructure { .. } | Query::InvariantViolation { .. } => 2,
        Query::HashMismatch { .. } => 3,
        _ => 70,
    }
}

/// Read `path` and split it into fixed-size blocks, zero-padding the final
/// block if the file length isn't a multiple of [`BLOCK_SIZE`].
fn read_state(path: &Path, algorithm: HashAlgorithm) -> Result<FsState, String> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let modified_at = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(format_system_time)
        .unwrap_or_else(|_| now_utc());
    let owner = owner_of(path);
    let read_only = fs::metadata(path).map(|m| m.permissions().readonly()).unwrap_or(false);

    let chunks: Vec<&[u8]> = if bytes.is_empty() {
        Vec::new()
    } else {
        bytes.chunks(BLOCK_SIZE).collect()
    };

    let mut blocks = Vec::with_capacity(chunks.len());
    let mut metadata = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let mut padded = chunk.to_vec();
        padded.resize(BLOCK_SIZE, 0);
        blocks.push(Block::new(algorithm, padded));
        metadata.push(BlockMetadata::new(modified_at.clone(), owner.clone(), read_only));
    }

    FsState::new(blocks, metadata).map_err(|e| e.to_string())
}

fn build_snapshot(path: &Path, algorithm: HashAlgorithm) -> Result<Snapshot, String> {
    let state = read_state(path, algorithm)?;
    Ok(Snapshot::capture(
        path.display().to_string(),
        now_utc(),
        state.blocks(),
        state.metadata(),
    ))
}

#[cfg(unix)]
fn owner_of(path: &Path) -> String {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path)
        .map(|m| m.uid().to_string())
        .unwrap_or_else(|_| "unknown".to_owned())
}

#[cfg(not(unix))]
fn owner_of(_path: &Path) -> String {
    "unknown".to_owned()
}

/// Minimal UTC timestamp formatting, duplicated per-crate rather than
/// pulling in a dependency purely for clock formatting (matches
/// `ochrance_verify::time`'s rationale).
fn now_utc() -> String {
    format_system_time(std::time::SystemTime::now())
}

fn format_system_time(time: std::time::SystemTime) -> String {
    let duration = time.duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        1970 + secs / 31_557_600,
        (secs % 31_557_600) / 2_629_800 + 1,
        (secs % 2_629_800) / 86400 + 1,
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis,
    )
}
