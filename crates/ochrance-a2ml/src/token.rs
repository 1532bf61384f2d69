use std::fmt;

use crate::location::Location;

/// The top-level section keywords the lexer recognises after `@`.
///
/// `@audit` sits alongside the four manifest-oriented sections because the
/// data model documents it as a real section with its own invariants
/// (monotonic timestamps, a stable hash chain), and the repair engine
/// requires every repair attempt to be logged to it — a lexer that could
/// never produce an `@audit` token would make that requirement
/// unsatisfiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Manifest,
    Refs,
    Attestation,
    Policy,
    Audit,
}

impl SectionTag {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Refs => "refs",
            Self::Attestation => "attestation",
            Self::Policy => "policy",
            Self::Audit => "audit",
        }
    }

    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "manifest" => Some(Self::Manifest),
            "refs" => Some(Self::Refs),
            "attestation" => Some(Self::Attestation),
            "policy" => Some(Self::Policy),
            "audit" => Some(Self::Audit),
            _ => None,
        }
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.keyword())
    }
}

/// A lexical token kind. `identifier`/`string-literal`/`hash-literal` carry
/// their decoded payload; everything else is structural.
///
/// Beyond the four punctuation tokens (`{`, `}`, `:`, `=`) and three
/// value-bearing tokens the grammar names, this implementation
/// additionally distinguishes `[`/`]` (list delimiters) and a blob
/// literal, since the grammar's `list`/`blob` value kinds need some
/// lexical realization and none is specified beyond their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Section(SectionTag),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Equals,
    Identifier(String),
    StringLiteral(String),
    HashLiteral(String),
    BlobLiteral(String),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(tag) => write!(f, "{tag}"),
            Self::LBrace => f.write_str("'{'"),
            Self::RBrace => f.write_str("'}'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::Colon => f.write_str("':'"),
            Self::Equals => f.write_str("'='"),
            Self::Identifier(s) => write!(f, "identifier {s:?}"),
            Self::StringLiteral(s) => write!(f, "string {s:?}"),
            Self::HashLiteral(s) => write!(f, "hash #{s}"),
            Self::BlobLiteral(s) => write!(f, "blob (len {})", s.len()),
            Self::Eof => f.write_str("EOF"),
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}
