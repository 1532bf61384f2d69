//! Proof witness algebra, verification modes, and the filesystem verifier.
#![forbid(unsafe_code)]

mod mode;
mod model;
mod time;
mod verifier;
mod witness;

pub use mode::{default_mode, satisfies_minimum, VerificationMode};
pub use model::{Block, BlockMetadata, FsManifest, FsState, LengthError, BLOCK_SIZE};
pub use verifier::verify;
pub use witness::{AttestationMetadata, HashEquality, PromotionError, Tier, Witness};
