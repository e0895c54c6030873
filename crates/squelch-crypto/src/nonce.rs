//! Per-message nonce and the IV pair it drives.

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{block::BLOCK_LEN, kdf};

/// Nonce length in bytes
pub const NONCE_LEN: usize = 16;

/// Bytes of OS entropy mixed into each generated nonce
pub const NONCE_ENTROPY_LEN: usize = 32;

/// A 16-byte per-message nonce.
///
/// Created by the sealing side only and carried in the envelope. Must never
/// repeat under one shared secret; [`Nonce::generate`] relies on the OS
/// CSPRNG for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Wrap raw nonce bytes.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a nonce from a slice. `None` unless exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; NONCE_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Generate a fresh nonce for `secret`.
    ///
    /// Mixes the secret, 32 bytes from the OS RNG and the wall clock through
    /// the `"nonce"` derivation.
    ///
    /// # Panics
    ///
    /// Panics if the OS RNG fails. Sealing without entropy would risk nonce
    /// reuse, so this is treated as unrecoverable.
    pub fn generate(secret: &[u8]) -> Self {
        let mut entropy = Zeroizing::new([0u8; NONCE_ENTROPY_LEN]);

        #[allow(clippy::expect_used)]
        getrandom::fill(&mut entropy[..])
            .expect("invariant: OS RNG failure is unrecoverable - cannot seal without entropy");

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos());

        Self::generate_with(secret, &entropy, nanos)
    }

    /// Deterministic core of [`Nonce::generate`].
    pub fn generate_with(
        secret: &[u8],
        entropy: &[u8; NONCE_ENTROPY_LEN],
        unix_nanos: u128,
    ) -> Self {
        let mut input = Zeroizing::new(Vec::with_capacity(secret.len() + NONCE_ENTROPY_LEN + 16));
        input.extend_from_slice(secret);
        input.extend_from_slice(entropy);
        input.extend_from_slice(&unix_nanos.to_be_bytes());

        let digest = Zeroizing::new(kdf::derive(kdf::NONCE_LABEL, &input));

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        Self(nonce)
    }

    /// IVs for both CBC layers.
    pub fn iv_pair(&self) -> IvPair {
        IvPair::from_nonce(self)
    }
}

/// IVs for the outer and inner CBC layers, both derived from one nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvPair {
    /// IV for the standard cipher: `nonce[0..8]`
    pub outer: [u8; BLOCK_LEN],
    /// IV for the custom cipher: `SHA-256(nonce)[0..8]`
    pub inner: [u8; BLOCK_LEN],
}

impl IvPair {
    /// Derive both IVs from `nonce`.
    pub fn from_nonce(nonce: &Nonce) -> Self {
        let mut outer = [0u8; BLOCK_LEN];
        outer.copy_from_slice(&nonce.0[..BLOCK_LEN]);

        let digest = Sha256::digest(nonce.0);
        let mut inner = [0u8; BLOCK_LEN];
        inner.copy_from_slice(&digest[..BLOCK_LEN]);

        Self { outer, inner }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn counting_nonce() -> Nonce {
        Nonce::from_bytes(std::array::from_fn(|i| i as u8))
    }

    #[test]
    fn iv_pair_matches_frozen_vector() {
        let ivs = counting_nonce().iv_pair();
        assert_eq!(ivs.outer, hex!("0001020304050607"));
        assert_eq!(ivs.inner, hex!("be45cb2605bf36be"));
    }

    #[test]
    fn from_slice_requires_exact_length() {
        assert!(Nonce::from_slice(&[0u8; 16]).is_some());
        assert!(Nonce::from_slice(&[0u8; 15]).is_none());
        assert!(Nonce::from_slice(&[0u8; 17]).is_none());
    }

    #[test]
    fn generate_with_is_deterministic() {
        let a = Nonce::generate_with(b"secret", &[1u8; 32], 42);
        let b = Nonce::generate_with(b"secret", &[1u8; 32], 42);
        assert_eq!(a, b);
    }

    #[test]
    fn generate_with_mixes_every_input() {
        let base = Nonce::generate_with(b"secret", &[1u8; 32], 42);
        assert_ne!(base, Nonce::generate_with(b"other", &[1u8; 32], 42));
        assert_ne!(base, Nonce::generate_with(b"secret", &[2u8; 32], 42));
        assert_ne!(base, Nonce::generate_with(b"secret", &[1u8; 32], 43));
    }

    #[test]
    fn generated_nonces_differ() {
        let a = Nonce::generate(b"correct horse");
        let b = Nonce::generate(b"correct horse");
        assert_ne!(a, b);
    }
}
