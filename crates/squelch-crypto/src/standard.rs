//! Standard cipher layer.
//!
//! The outer layer of the pipeline is a well-known block cipher in CBC mode
//! with PKCS#7 padding, so any plaintext length is accepted and the output is
//! always block-aligned for the inner layer. The algorithm is not implemented
//! here; [`IdeaCbc`] composes the RustCrypto `idea` and `cbc` crates.

use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use idea::Idea;

use crate::CryptoError;

/// Key length of the standard cipher (128 bits)
pub const STANDARD_KEY_LEN: usize = 16;

/// IV length of the standard cipher (one 64-bit block)
pub const STANDARD_IV_LEN: usize = 8;

/// Padded CBC encryption with a standard block cipher.
///
/// Any implementation must produce output whose length is a non-zero multiple
/// of 8 bytes, because the inner layer chains 8-byte blocks without padding.
pub trait StandardCipher {
    /// Pad and encrypt `plaintext`.
    fn encrypt_padded(
        key: &[u8; STANDARD_KEY_LEN],
        iv: &[u8; STANDARD_IV_LEN],
        plaintext: &[u8],
    ) -> Vec<u8>;

    /// Decrypt and unpad `ciphertext`.
    ///
    /// # Errors
    ///
    /// - `Padding` if the length is unaligned or the padding is malformed
    fn decrypt_padded(
        key: &[u8; STANDARD_KEY_LEN],
        iv: &[u8; STANDARD_IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// IDEA in CBC mode with PKCS#7 padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdeaCbc;

impl StandardCipher for IdeaCbc {
    fn encrypt_padded(
        key: &[u8; STANDARD_KEY_LEN],
        iv: &[u8; STANDARD_IV_LEN],
        plaintext: &[u8],
    ) -> Vec<u8> {
        cbc::Encryptor::<Idea>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    fn decrypt_padded(
        key: &[u8; STANDARD_KEY_LEN],
        iv: &[u8; STANDARD_IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        cbc::Decryptor::<Idea>::new(key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Padding)
    }
}
