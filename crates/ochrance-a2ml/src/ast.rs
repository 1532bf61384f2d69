use crate::token::SectionTag;

/// An A2ML value. Sum of the seven value kinds the grammar allows in an
/// `entry`. Nested blocks are represented at the [`Field`] level, not
/// here — a value is always a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A double-quoted string literal, already escape-decoded.
    Str(String),
    /// A bareword (identifier used where the grammar allows a value).
    Ident(String),
    /// A `#`-prefixed hex digest. The algorithm it is under is not carried
    /// in the literal itself — it is resolved by the validator against the
    /// document's declared `algorithm` field. The wire-form
    /// `algorithm:hexdigest` description this crate reconciles against is
    /// treated as describing [`ochrance_oracle::Digest::to_wire`] rather
    /// than the A2ML token grammar.
    Hash(String),
    Integer(i64),
    /// ISO-8601 with a mandatory trailing `Z`, stored as written.
    Timestamp(String),
    List(Vec<Value>),
    /// Base64-wrapped opaque payload, already decoded.
    Blob(Vec<u8>),
    Bool(bool),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Ident(s) | Self::Timestamp(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// The right-hand side of an `entry`: either a leaf value or a nested block
/// of further fields (grammar's `entry ← identifier '{' entry* '}'`).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    Block(Vec<Field>),
}

/// One `key: value` or `key { ... }` entry. Field order within a section is
/// preserved in the AST — it affects serialisation but not semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match &self.value {
            FieldValue::Value(v) => Some(v),
            FieldValue::Block(_) => None,
        }
    }

    #[must_use]
    pub fn block(&self) -> Option<&[Field]> {
        match &self.value {
            FieldValue::Block(fields) => Some(fields),
            FieldValue::Value(_) => None,
        }
    }
}

/// Look up the first field with a given key among a flat field list.
#[must_use]
pub fn find<'a>(fields: &'a [Field], key: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.key == key)
}

/// A parsed `@manifest`/`@refs`/`@attestation`/`@policy`/`@audit` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub tag: SectionTag,
    pub fields: Vec<Field>,
}

impl Section {
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Field> {
        find(&self.fields, key)
    }
}

/// The parsed document: `(version, sections)`. `@manifest` is required by
/// the parser; the rest are optional. Section
/// order in the source is not semantically significant — callers look
/// sections up by tag via [`Manifest::section`].
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub version: (u32, u32),
    pub sections: Vec<Section>,
}

impl Manifest {
    #[must_use]
    pub fn section(&self, tag: SectionTag) -> Option<&Section> {
        self.sections.iter().find(|s| s.tag == tag)
    }

    /// Sections in the document's fixed canonical order, used by the
    /// serializer's normalisation pass: the AST normalises to a fixed
    /// order for canonicalisation.
    #[must_use]
    pub fn sections_in_canonical_order(&self) -> Vec<&Section> {
        const ORDER: [SectionTag; 5] = [
            SectionTag::Manifest,
            SectionTag::Refs,
            SectionTag::Attestation,
            SectionTag::Policy,
            SectionTag::Audit,
        ];
        ORDER
            .iter()
            .filter_map(|tag| self.section(*tag))
            .collect()
    }
}
