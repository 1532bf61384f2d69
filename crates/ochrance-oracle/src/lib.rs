//! Content-hash oracle.
//!
//! A pure, opaque function from byte sequences to fixed-size digests, over
//! one of four supported algorithms. Nothing in this crate ever inspects
//! the meaning of the bytes it hashes — it is a leaf dependency for every
//! other crate in this workspace.
#![forbid(unsafe_code)]

mod algorithm;
mod digest;

pub use algorithm::{HashAlgorithm, UnknownAlgorithm};
pub use digest::{Digest, DigestError, DigestParseError};

/// Compute `oracle(bytes)` under `algorithm`.
#[must_use]
pub fn oracle(algorithm: HashAlgorithm, bytes: &[u8]) -> Digest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            use sha2::Digest as _;
            let out = sha2::Sha256::digest(bytes);
            Digest::from_raw(algorithm, out.to_vec())
        }
        HashAlgorithm::Sha384 => {
            use sha2::Digest as _;
            let out = sha2::Sha384::digest(bytes);
            Digest::from_raw(algorithm, out.to_vec())
        }
        HashAlgorithm::Sha512 => {
            use sha2::Digest as _;
            let out = sha2::Sha512::digest(bytes);
            Digest::from_raw(algorithm, out.to_vec())
        }
        HashAlgorithm::Blake3 => {
            let out = blake3::hash(bytes);
            Digest::from_raw(algorithm, out.as_bytes().to_vec())
        }
    }
}

/// Combine two digests under a domain-separated internal-node rule:
/// `oracle(tag ++ left ++ right)`. Used by the Merkle engine; exposed here
/// so callers never have to know the concatenation layout.
#[must_use]
pub fn combine(algorithm: HashAlgorithm, tag: u8, left: &Digest, right: &Digest) -> Digest {
    let mut buf = Vec::with_capacity(1 + left.as_bytes().len() + right.as_bytes().len());
    buf.push(tag);
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    oracle(algorithm, &buf)
}
