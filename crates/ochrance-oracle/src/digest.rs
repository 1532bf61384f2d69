use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::algorithm::HashAlgorithm;

/// Error constructing a [`Digest`] from raw bytes or hex.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DigestError {
    #[error("digest length {actual} does not match {algorithm}'s expected length {expected}")]
    WrongLength {
        algorithm: HashAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("malformed hex digest: {0}")]
    MalformedHex(#[from] hex::FromHexError),
}

/// A `(algorithm-tag, byte-sequence)` pair whose byte-sequence length is
/// fixed by the tag. Equality is structural and constant-time.
///
/// The only way to obtain one is via [`crate::oracle`] (hashing real bytes),
/// [`Digest::from_hex`] (parsing a trusted hex literal), or
/// [`Digest::zero`] (the well-known empty-root sentinel) — there is no
/// `Default` impl, so a digest can never silently be all-zero by accident.
#[derive(Debug, Clone)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Construct from raw bytes already known to match `algorithm`'s length.
    /// Private: the sole point of length establishment for every `Digest`.
    pub(crate) fn from_raw(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), algorithm.digest_len());
        Self { algorithm, bytes }
    }

    /// Parse a digest from a hex string under the given algorithm. Accepts
    /// either case, per the wire format's lowercase-canonical / case-insensitive
    /// parsing rule.
    pub fn from_hex(algorithm: HashAlgorithm, hex_str: &str) -> Result<Self, DigestError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != algorithm.digest_len() {
            return Err(DigestError::WrongLength {
                algorithm,
                expected: algorithm.digest_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// The well-known all-zero sentinel digest for an algorithm — used as
    /// the empty-root of a Merkle tree built over zero leaves.
    #[must_use]
    pub fn zero(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            bytes: vec![0u8; algorithm.digest_len()],
        }
    }

    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex encoding of the digest bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// `algorithm:hexdigest`, the A2ML hash-literal wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{}:{}", self.algorithm, self.to_hex())
    }

    /// Parse the `algorithm:hexdigest` wire form.
    pub fn from_wire(s: &str) -> Result<Self, DigestParseError> {
        let (tag, hex_str) = s
            .split_once(':')
            .ok_or(DigestParseError::MissingSeparator)?;
        let algorithm =
            HashAlgorithm::from_tag_loose(tag).ok_or_else(|| DigestParseError::UnknownAlgorithm(tag.to_owned()))?;
        Ok(Self::from_hex(algorithm, hex_str)?)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DigestParseError {
    #[error("hash literal missing ':' separator between algorithm and hex digest")]
    MissingSeparator,
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error(transparent)]
    Digest(#[from] DigestError),
}

/// Structural equality with constant-time byte comparison — adversary
/// controlled digests (e.g. block hashes read off untrusted storage) are
/// compared without early-exit timing signal. The algorithm tag itself is
/// public information and is compared normally.
impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        if self.algorithm != other.algorithm || self.bytes.len() != other.bytes.len() {
            return false;
        }
        let mut diff: u8 = 0;
        for (a, b) in self.bytes.iter().zip(other.bytes.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

impl Eq for Digest {}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_wire(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_digest_has_correct_length() {
        let d = Digest::zero(HashAlgorithm::Sha256);
        assert_eq!(d.as_bytes().len(), 32);
        assert!(d.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn wire_round_trip() {
        let d = Digest::from_hex(HashAlgorithm::Sha256, &"ab".repeat(32)).unwrap();
        let wire = d.to_wire();
        assert_eq!(wire, format!("sha256:{}", "ab".repeat(32)));
        let parsed = Digest::from_wire(&wire).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = Digest::from_hex(HashAlgorithm::Sha256, "ab").unwrap_err();
        assert!(matches!(err, DigestError::WrongLength { .. }));
    }

    #[test]
    fn equality_requires_same_algorithm() {
        let a = Digest::zero(HashAlgorithm::Sha256);
        let b = Digest::zero(HashAlgorithm::Blake3);
        assert_ne!(a, b);
    }
}
