use crate::ast::{Field, FieldValue, Manifest, Section, Value};
use crate::location::Location;
use crate::token::{SectionTag, Token, TokenKind};

/// Maximum nesting depth for blocks within a section.
pub const MAX_NESTING_DEPTH: u32 = 8;
/// Maximum field count within a single section or nested block.
pub const MAX_FIELDS_PER_SECTION: usize = 1024;
/// Maximum element count of a `list` value.
pub const MAX_LIST_LENGTH: usize = 65_536;

/// Why [`parse`] failed. The parser accumulates no more than one error: it
/// stops at the first structural problem, total by bounded recursion.
/// Batch accumulation is the *validator*'s job, not the parser's.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing required section @{name}")]
    MissingRequired { name: String },
    #[error("{location}: duplicate section @{name}")]
    DuplicateSection { name: String, location: Location },
    #[error("{location}: nesting depth exceeds limit {limit}")]
    NestingExceeded { limit: u32, location: Location },
    #[error("{location}: {what} count {actual} exceeds limit {limit}")]
    CapExceeded {
        what: String,
        limit: usize,
        actual: usize,
        location: Location,
    },
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },
}

/// Parse a token list (as produced by [`crate::lexer::tokenize`]) into a
/// [`Manifest`] AST. Total by bounded recursion: every recursive call either
/// consumes a token or is rejected by the depth/fuel bound before recursing
/// further.
///
/// The returned manifest's `version` defaults to `(1, 0)`; callers parsing a
/// full `.a2ml` document should use [`crate::parse_document`], which reads
/// the wire header line first.
pub fn parse(tokens: &[Token]) -> Result<Manifest, ParseError> {
    let mut p = Parser { tokens, pos: 0 };
    let sections = p.parse_sections()?;
    p.expect_eof()?;

    if sections.iter().all(|s: &Section| s.tag != SectionTag::Manifest) {
        return Err(ParseError::MissingRequired {
            name: "manifest".to_owned(),
        });
    }

    Ok(Manifest {
        version: (1, 0),
        sections,
    })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        // `tokenize` always ends in `Eof`, so indexing past the real
        // content still lands on a valid token — `pos` never needs a bounds
        // check, which is what keeps every loop below provably total.
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn location(&self) -> Location {
        self.peek().location
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek().kind, TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of document"))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_owned(),
            found: self.peek().kind.to_string(),
            location: self.location(),
        }
    }

    fn parse_sections(&mut self) -> Result<Vec<Section>, ParseError> {
        let mut sections: Vec<Section> = Vec::new();
        let mut seen: Vec<(SectionTag, Location)> = Vec::new();

        while let TokenKind::Section(tag) = self.peek().kind {
            let location = self.location();
            if seen.iter().any(|(t, _)| *t == tag) {
                return Err(ParseError::DuplicateSection {
                    name: tag.keyword().to_owned(),
                    location,
                });
            }
            seen.push((tag, location));
            let section = self.parse_section(tag)?;
            sections.push(section);
        }

        Ok(sections)
    }

    fn parse_section(&mut self, tag: SectionTag) -> Result<Section, ParseError> {
        self.advance(); // section keyword
        self.expect(&TokenKind::LBrace)?;
        let fields = self.parse_entries(1)?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Section { tag, fields })
    }

    fn expect(&mut self, want: &TokenKind) -> Result<&Token, ParseError> {
        if &self.peek().kind == want {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&want.to_string()))
        }
    }

    /// Parse `entry*` until the next `}` (caller consumes the closing
    /// brace). `depth` counts the nesting level this call sits at, starting
    /// at 1 for a section's direct fields.
    fn parse_entries(&mut self, depth: u32) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace) {
            if fields.len() >= MAX_FIELDS_PER_SECTION {
                return Err(ParseError::CapExceeded {
                    what: "field".to_owned(),
                    limit: MAX_FIELDS_PER_SECTION,
                    actual: fields.len() + 1,
                    location: self.location(),
                });
            }
            fields.push(self.parse_entry(depth)?);
        }
        Ok(fields)
    }

    fn parse_entry(&mut self, depth: u32) -> Result<Field, ParseError> {
        let key = match &self.peek().kind {
            TokenKind::Identifier(s) => s.clone(),
            _ => return Err(self.unexpected("field name")),
        };
        self.advance();

        if matches!(self.peek().kind, TokenKind::LBrace) {
            if depth + 1 > MAX_NESTING_DEPTH {
                return Err(ParseError::NestingExceeded {
                    limit: MAX_NESTING_DEPTH,
                    location: self.location(),
                });
            }
            self.advance();
            let fields = self.parse_entries(depth + 1)?;
            self.expect(&TokenKind::RBrace)?;
            return Ok(Field {
                key,
                value: FieldValue::Block(fields),
            });
        }

        match self.peek().kind {
            TokenKind::Colon | TokenKind::Equals => {
                self.advance();
            }
            _ => return Err(self.unexpected("':' or '=' or '{'")),
        }

        let value = self.parse_value(depth)?;
        Ok(Field {
            key,
            value: FieldValue::Value(value),
        })
    }

    fn parse_value(&mut self, depth: u32) -> Result<Value, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(if looks_like_timestamp(&s) {
                    Value::Timestamp(s)
                } else {
                    Value::Str(s)
                })
            }
            TokenKind::HashLiteral(hex) => {
                self.advance();
                Ok(Value::Hash(hex))
            }
            TokenKind::BlobLiteral(b64) => {
                self.advance();
                use base64::Engine as _;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(&b64)
                    .map_err(|_| ParseError::UnexpectedToken {
                        expected: "valid base64 blob".to_owned(),
                        found: format!("base64({b64})"),
                        location: tok.location,
                    })?;
                Ok(Value::Blob(bytes))
            }
            TokenKind::Identifier(word) => {
                self.advance();
                Ok(parse_bareword_value(&word))
            }
            TokenKind::LBracket => self.parse_list(depth),
            _ => Err(self.unexpected("value")),
        }
    }

    fn parse_list(&mut self, depth: u32) -> Result<Value, ParseError> {
        if depth + 1 > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingExceeded {
                limit: MAX_NESTING_DEPTH,
                location: self.location(),
            });
        }
        self.advance(); // '['
        let mut items = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBracket) {
            if items.len() >= MAX_LIST_LENGTH {
                return Err(ParseError::CapExceeded {
                    what: "list element".to_owned(),
                    limit: MAX_LIST_LENGTH,
                    actual: items.len() + 1,
                    location: self.location(),
                });
            }
            items.push(self.parse_value(depth + 1)?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Value::List(items))
    }
}

fn looks_like_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 20
        && s.ends_with('Z')
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[13] == b':'
        && bytes[16] == b':'
}

fn parse_bareword_value(word: &str) -> Value {
    match word {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = word.parse::<i64>() {
                Value::Integer(n)
            } else {
                Value::Ident(word.to_owned())
            }
        }
    }
}
