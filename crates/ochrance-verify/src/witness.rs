//! Three-tier proof witness algebra.
//!
//! Each tier is a strict strengthening of the previous one. There is
//! deliberately no `Default`/bare constructor for any tier above
//! `Structural` — the only way to obtain a `HashMatch` is to [`promote`] a
//! `Structural` with hash-equality evidence, and the only way to obtain an
//! `Attested` is to [`promote`] a `HashMatch` with attestation metadata.
//! No tier may be fabricated out of thin air.

use serde::{Deserialize, Serialize};

/// Evidence that a computed digest equals an expected one. Carried by a
/// [`Witness::HashMatch`] as the reason it may claim hash equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashEquality {
    pub computed: String,
    pub expected: String,
}

/// Attestation metadata attached when promoting to [`Witness::Attested`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationMetadata {
    pub timestamp: String,
    pub invariant_satisfied: bool,
}

/// A witness, typed by the strength of proof it carries.
///
/// `Structural` asserts structural well-formedness only; `HashMatch` adds
/// per-block hash equality; `Attested` adds attestation metadata (timestamp
/// plus an invariant-satisfaction flag). Consumers that require tier `T`
/// accept witnesses of tier `T` or stricter ([`Witness::tier`] plus
/// [`Tier`]'s total order is how callers check that, e.g. in
/// [`crate::mode::satisfies_minimum`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier")]
pub enum Witness {
    Structural,
    HashMatch { evidence: Vec<HashEquality> },
    Attested {
        evidence: Vec<HashEquality>,
        attestation: AttestationMetadata,
    },
}

/// Why [`Witness::promote_to_attested`] refused to promote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromotionError {
    #[error("cannot promote a Structural witness to Attested without hash-match evidence first")]
    NoHashEvidence,
}

/// The strength ordering of a witness's tier, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Structural,
    HashMatch,
    Attested,
}

impl Witness {
    #[must_use]
    pub const fn tier(&self) -> Tier {
        match self {
            Self::Structural => Tier::Structural,
            Self::HashMatch { .. } => Tier::HashMatch,
            Self::Attested { .. } => Tier::Attested,
        }
    }

    /// `Structural` + hash-equality evidence → `HashMatch`.
    #[must_use]
    pub fn promote_to_hash_match(evidence: Vec<HashEquality>) -> Self {
        Self::HashMatch { evidence }
    }

    /// `HashMatch` + attestation metadata → `Attested`. Consumes the
    /// `HashMatch` witness so a caller cannot hold both the weaker and
    /// stronger witness for the same verification cycle. There is no path
    /// from `Structural` directly to `Attested`: a caller holding only
    /// structural evidence must promote through `HashMatch` first, or else
    /// this returns `Err`.
    pub fn promote_to_attested(self, attestation: AttestationMetadata) -> Result<Self, PromotionError> {
        match self {
            Self::HashMatch { evidence } => Ok(Self::Attested { evidence, attestation }),
            already @ Self::Attested { .. } => Ok(already),
            Self::Structural => Err(PromotionError::NoHashEvidence),
        }
    }

    /// Project to `HashMatch` by discarding attestation metadata, or to
    /// `Structural` by also discarding hash evidence. A promoted witness
    /// always projects back to its pre-promotion shape.
    #[must_use]
    pub fn weaken_to_hash_match(&self) -> Self {
        match self {
            Self::Structural => Self::Structural,
            Self::HashMatch { evidence } => Self::HashMatch {
                evidence: evidence.clone(),
            },
            Self::Attested { evidence, .. } => Self::HashMatch {
                evidence: evidence.clone(),
            },
        }
    }

    #[must_use]
    pub fn weaken_to_structural(&self) -> Self {
        Self::Structural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> Vec<HashEquality> {
        vec![HashEquality {
            computed: "sha256:aa".into(),
            expected: "sha256:aa".into(),
        }]
    }

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(Tier::Structural < Tier::HashMatch);
        assert!(Tier::HashMatch < Tier::Attested);
    }

    #[test]
    fn promotion_chain_reaches_attested() {
        let w = Witness::promote_to_hash_match(evidence());
        assert_eq!(w.tier(), Tier::HashMatch);
        let w = w
            .promote_to_attested(AttestationMetadata {
                timestamp: "2026-07-28T00:00:00Z".into(),
                invariant_satisfied: true,
            })
            .unwrap();
        assert_eq!(w.tier(), Tier::Attested);
    }

    #[test]
    fn weakening_projects_back_to_pre_promotion_shape() {
        let hash_match = Witness::promote_to_hash_match(evidence());
        let attested = hash_match
            .clone()
            .promote_to_attested(AttestationMetadata {
                timestamp: "2026-07-28T00:00:00Z".into(),
                invariant_satisfied: true,
            })
            .unwrap();
        assert_eq!(attested.weaken_to_hash_match(), hash_match);
        assert_eq!(attested.weaken_to_structural(), Witness::Structural);
        assert_eq!(hash_match.weaken_to_structural(), Witness::Structural);
    }

    #[test]
    fn promoting_structural_directly_to_attested_is_rejected() {
        let err = Witness::Structural
            .promote_to_attested(AttestationMetadata {
                timestamp: "2026-07-28T00:00:00Z".into(),
                invariant_satisfied: true,
            })
            .unwrap_err();
        assert_eq!(err, PromotionError::NoHashEvidence);
    }
}
