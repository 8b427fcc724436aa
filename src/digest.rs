//! Digest functions and the digest strategy's construction-time config.
//!
//! Two fingerprints are available:
//! - `Sha256`: 256-bit, collision resistant under standard assumptions.
//! - `Fast32`: 32-bit `FxHasher` output. Not adversarially safe. Collisions
//!   become likely around 2^16 distinct values (birthday bound), so use it only
//!   for trusted input with a known, modest size.

use core::fmt;
use core::hash::Hasher;
use rustc_hash::FxHasher;
use sha2::{Digest as _, Sha256};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Fast32,
}

impl DigestAlgorithm {
    pub fn digest(self, bytes: &[u8]) -> Fingerprint {
        match self {
            DigestAlgorithm::Sha256 => Fingerprint::Sha256(sha256(bytes)),
            DigestAlgorithm::Fast32 => Fingerprint::Fast32(fast32(bytes)),
        }
    }

    pub fn width_bits(self) -> u32 {
        match self {
            DigestAlgorithm::Sha256 => 256,
            DigestAlgorithm::Fast32 => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Fast32 => "fast32",
        }
    }
}

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

pub fn fast32(bytes: &[u8]) -> u32 {
    let mut h = FxHasher::default();
    h.write(bytes);
    let wide = h.finish();
    (wide ^ (wide >> 32)) as u32
}

/// Fixed-width fingerprint of a canonical byte sequence.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Sha256([u8; 32]),
    Fast32(u32),
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Sha256(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Fingerprint::Fast32(v) => write!(f, "{v:08x}"),
        }
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Sha256(_) => write!(f, "Sha256({self})"),
            Fingerprint::Fast32(_) => write!(f, "Fast32({self})"),
        }
    }
}

/// What equal fingerprints mean for set membership.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionPolicy {
    /// The fingerprint is the key. Two different values with the same
    /// fingerprint are the same element.
    #[default]
    Trust,
    /// Keys also keep the canonical bytes; equal fingerprints with different
    /// bytes are distinct elements.
    Verify,
}

/// Construction-time configuration of the content-digest strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DigestConfig {
    pub algorithm: DigestAlgorithm,
    pub collisions: CollisionPolicy,
}

impl DigestConfig {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            collisions: CollisionPolicy::default(),
        }
    }

    /// `Fast32` fingerprints trusted as keys.
    pub fn fast() -> Self {
        Self::new(DigestAlgorithm::Fast32)
    }

    pub fn verify_collisions(mut self) -> Self {
        self.collisions = CollisionPolicy::Verify;
        self
    }

    /// Element count at which a collision becomes likely, for configurations
    /// where a collision would merge elements. `None` when out of reach.
    pub fn birthday_bound(&self) -> Option<usize> {
        match self.collisions {
            CollisionPolicy::Verify => None,
            CollisionPolicy::Trust => {
                let half = self.algorithm.width_bits() / 2;
                1usize.checked_shl(half)
            }
        }
    }
}
