//! Cipher-block chaining over any 8-byte [`BlockCipher`].
//!
//! Raw CBC: no padding. Inputs must already be block-aligned, which is what
//! the inner layer of the pipeline sees (the outer layer pads).

use crate::{
    CryptoError,
    block::{BLOCK_LEN, BlockCipher},
};

/// Encrypt `plaintext` in CBC mode.
///
/// # Errors
///
/// - `UnalignedInput` if `plaintext.len()` is not a multiple of 8
/// - `InvalidIvLength` if `iv` is not 8 bytes
/// - `InvalidKeyLength` if `key` is not `C::KEY_LEN` bytes
pub fn cbc_encrypt<C: BlockCipher>(
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let (key, iv) = validate::<C>(plaintext, key, iv)?;

    let mut out = Vec::with_capacity(plaintext.len());
    let mut chain = iv;

    for chunk in plaintext.chunks_exact(BLOCK_LEN) {
        let mixed = xor_block(&chain, chunk);
        chain = C::encrypt_block(&mixed, &key);
        out.extend_from_slice(&chain);
    }

    Ok(out)
}

/// Decrypt `ciphertext` in CBC mode.
///
/// Each deciphered block is XORed with the previous ciphertext block (the IV
/// for the first one).
///
/// # Errors
///
/// Same conditions as [`cbc_encrypt`].
pub fn cbc_decrypt<C: BlockCipher>(
    ciphertext: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let (key, iv) = validate::<C>(ciphertext, key, iv)?;

    let mut out = Vec::with_capacity(ciphertext.len());
    let mut chain = iv;

    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let block = to_block(chunk);
        let plain = xor_block(&chain, &C::decrypt_block(&block, &key));
        out.extend_from_slice(&plain);
        chain = block;
    }

    Ok(out)
}

fn validate<C: BlockCipher>(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<(C::Key, [u8; BLOCK_LEN]), CryptoError> {
    if data.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::UnalignedInput { len: data.len(), block: BLOCK_LEN });
    }

    let iv = <[u8; BLOCK_LEN]>::try_from(iv)
        .map_err(|_| CryptoError::InvalidIvLength { expected: BLOCK_LEN, actual: iv.len() })?;

    let key = C::key_from_slice(key)
        .ok_or(CryptoError::InvalidKeyLength { expected: C::KEY_LEN, actual: key.len() })?;

    Ok((key, iv))
}

fn to_block(chunk: &[u8]) -> [u8; BLOCK_LEN] {
    std::array::from_fn(|i| chunk[i])
}

fn xor_block(a: &[u8; BLOCK_LEN], b: &[u8]) -> [u8; BLOCK_LEN] {
    std::array::from_fn(|i| a[i] ^ b[i])
}
