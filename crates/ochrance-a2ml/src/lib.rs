//! A2ML: the attestation-and-audit markup language.
//!
//! Lexer → parser → validator → serializer, total end to end.
//! [`parse_document`]/[`serialize_document`] handle the full `.a2ml` wire
//! format including the `a2ml/MAJOR.MINOR` header line;
//! [`lexer::tokenize`]/[`parser::parse`]/[`serialize::serialize_canonical`]
//! operate on the section body alone and are what the round-trip property
//! tests exercise directly.
#![forbid(unsafe_code)]

pub mod ast;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod serialize;
pub mod token;
pub mod validate;

pub use ast::{Field, FieldValue, Manifest, Section, Value};
pub use lexer::LexError;
pub use location::Location;
pub use parser::ParseError;
pub use token::{SectionTag, Token, TokenKind};
pub use validate::ValidationError;

/// MIME type for `.a2ml` documents.
pub const MIME_TYPE: &str = "application/vnd.ochrance.a2ml+text";
/// Canonical file extension for `.a2ml` documents.
pub const FILE_EXTENSION: &str = "a2ml";
/// Wire format major/minor this crate reads and writes.
pub const WIRE_VERSION: (u32, u32) = (1, 0);

/// Why [`parse_document`] failed — either the header line is malformed, or
/// lexing/parsing of the section body failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("missing or malformed a2ml header line (expected 'a2ml/MAJOR.MINOR')")]
    MalformedHeader,
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Parse a complete `.a2ml` wire document: header line plus section body.
/// The header line must read exactly `a2ml/MAJOR.MINOR\n`.
pub fn parse_document(source: &str) -> Result<Manifest, DocumentError> {
    let (header, rest) = source.split_once('\n').ok_or(DocumentError::MalformedHeader)?;
    let version = parse_header(header).ok_or(DocumentError::MalformedHeader)?;

    let tokens = lexer::tokenize(rest)?;
    let mut manifest = parser::parse(&tokens)?;
    manifest.version = version;
    Ok(manifest)
}

/// Render a complete `.a2ml` wire document: header line plus the canonical
/// serialization of its sections.
#[must_use]
pub fn serialize_document(manifest: &Manifest) -> String {
    format!(
        "a2ml/{}.{}\n{}\n",
        manifest.version.0,
        manifest.version.1,
        serialize::serialize_canonical(manifest)
    )
}

fn parse_header(line: &str) -> Option<(u32, u32)> {
    let rest = line.strip_prefix("a2ml/")?;
    let (major, minor) = rest.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
