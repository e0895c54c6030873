//! Purpose-labeled key derivation.
//!
//! Every key used by the envelope comes from the shared secret through
//! [`derive`]: `SHA-256(prefix ‖ label ‖ secret)`. Distinct labels give
//! independent outputs, so learning one derived key says nothing about the
//! others or about the secret.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{block, standard};

/// Domain-separation prefix for every derivation
pub const KDF_PREFIX: &[u8] = b"squelch/kdf/v1/";

/// Label for the standard (outer) cipher key
pub const STANDARD_CIPHER_LABEL: &str = "standard-cipher";

/// Label for the custom (inner) cipher key
pub const CUSTOM_CIPHER_LABEL: &str = "custom-cipher";

/// Label for the envelope MAC key
pub const MAC_LABEL: &str = "mac";

/// Label for nonce generation
pub const NONCE_LABEL: &str = "nonce";

/// Length of a full derivation output
pub const DERIVED_LEN: usize = 32;

/// Derive 32 bytes for `label` from `secret`.
///
/// Infallible and deterministic for any input, including an empty secret.
pub fn derive(label: &str, secret: &[u8]) -> [u8; DERIVED_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(KDF_PREFIX);
    hasher.update(label.as_bytes());
    hasher.update(secret);
    hasher.finalize().into()
}

/// The three per-purpose keys for one shared secret.
///
/// Recomputed on every seal/open and zeroized on drop. Never persisted.
pub struct DerivedKeys {
    standard: Zeroizing<[u8; standard::STANDARD_KEY_LEN]>,
    custom: Zeroizing<[u8; block::KEY_LEN]>,
    mac: Zeroizing<[u8; DERIVED_LEN]>,
}

impl DerivedKeys {
    /// Derive all envelope keys from `secret`.
    pub fn derive(secret: &[u8]) -> Self {
        let standard = Zeroizing::new(derive(STANDARD_CIPHER_LABEL, secret));
        let custom = Zeroizing::new(derive(CUSTOM_CIPHER_LABEL, secret));

        Self {
            standard: Zeroizing::new(truncate(&standard)),
            custom: Zeroizing::new(truncate(&custom)),
            mac: Zeroizing::new(derive(MAC_LABEL, secret)),
        }
    }

    /// 128-bit key for the standard cipher layer.
    pub fn standard(&self) -> &[u8; standard::STANDARD_KEY_LEN] {
        &self.standard
    }

    /// 80-bit key for the custom cipher layer.
    pub fn custom(&self) -> &[u8; block::KEY_LEN] {
        &self.custom
    }

    /// 256-bit key for the envelope tag.
    pub fn mac(&self) -> &[u8; DERIVED_LEN] {
        &self.mac
    }
}

fn truncate<const N: usize>(full: &[u8; DERIVED_LEN]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&full[..N]);
    out
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    const SECRET: &[u8] = b"correct horse";

    #[test]
    fn derive_matches_frozen_vectors() {
        assert_eq!(
            derive(STANDARD_CIPHER_LABEL, SECRET),
            hex!("f9fb6b618a39b0b3a07213a625a946c0e3327c0e9a4c9cdf63fb4f25d80a6033")
        );
        assert_eq!(
            derive(CUSTOM_CIPHER_LABEL, SECRET),
            hex!("d9e9c7cc710feb0588eed62ce05f5beccab4cdcf5f4a6a25beec4fcd86ca5d2c")
        );
        assert_eq!(
            derive(MAC_LABEL, SECRET),
            hex!("909473be989a4041a4f1af52a5fd8e514cc04ec4ad1730f2bbf80b1c6dc3765b")
        );
        assert_eq!(
            derive(NONCE_LABEL, SECRET),
            hex!("f12060cbddc9fba08135eca46c3fa9d295bbc413b87b49d6e6d0da9dd31d38c2")
        );
    }

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(derive(MAC_LABEL, SECRET), derive(MAC_LABEL, SECRET));
    }

    #[test]
    fn different_labels_produce_different_outputs() {
        let labels = [STANDARD_CIPHER_LABEL, CUSTOM_CIPHER_LABEL, MAC_LABEL, NONCE_LABEL];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(derive(a, SECRET), derive(b, SECRET), "{a} and {b} must differ");
            }
        }
    }

    #[test]
    fn different_secrets_produce_different_outputs() {
        assert_ne!(derive(MAC_LABEL, b"secret a"), derive(MAC_LABEL, b"secret b"));
    }

    #[test]
    fn empty_secret_is_accepted() {
        let keys = DerivedKeys::derive(b"");
        assert_ne!(keys.mac(), &[0u8; DERIVED_LEN]);
    }

    #[test]
    fn derived_keys_are_truncated_prefixes() {
        let keys = DerivedKeys::derive(SECRET);

        assert_eq!(keys.standard().as_slice(), &derive(STANDARD_CIPHER_LABEL, SECRET)[..16]);
        assert_eq!(keys.custom().as_slice(), &derive(CUSTOM_CIPHER_LABEL, SECRET)[..10]);
        assert_eq!(keys.mac(), &derive(MAC_LABEL, SECRET));
    }
}
