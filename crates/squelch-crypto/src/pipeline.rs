//! Layered seal/open pipeline.
//!
//! Seal runs the standard cipher, then the custom cipher, tags the result,
//! and renders it as text. Open verifies the tag before touching either
//! cipher, then peels the layers in reverse.
//!
//! Every open failure is reported as [`NotAuthentic`]. Which step failed is
//! never exposed.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    BLOCK_LEN, BlockCipher, DerivedKeys, Envelope, IdeaCbc, NotAuthentic, Skipjack,
    StandardCipher, cbc,
    nonce::{NONCE_LEN, Nonce},
    obfuscate::rot13,
};

type HmacSha256 = Hmac<Sha256>;

/// Seal `plaintext` under `secret` with a freshly generated nonce.
///
/// # Panics
///
/// Panics if the OS RNG fails (see [`Nonce::generate`]).
pub fn seal(secret: &[u8], plaintext: &[u8]) -> Envelope {
    seal_with_nonce(secret, plaintext, Nonce::generate(secret))
}

/// Seal `plaintext` under `secret` with a caller-chosen nonce.
///
/// Deterministic. Reusing a nonce under the same secret leaks plaintext
/// equality, so outside of tests use [`seal`].
pub fn seal_with_nonce(secret: &[u8], plaintext: &[u8], nonce: Nonce) -> Envelope {
    seal_layers::<IdeaCbc, Skipjack>(secret, plaintext, nonce)
}

/// Open an envelope sealed under `secret`.
///
/// # Errors
///
/// - `NotAuthentic` on any failure: undecodable fields, wrong nonce length,
///   tag mismatch, or bad padding after decryption
pub fn open(secret: &[u8], envelope: &Envelope) -> Result<Vec<u8>, NotAuthentic> {
    open_layers::<IdeaCbc, Skipjack>(secret, envelope)
}

fn seal_layers<S: StandardCipher, C: BlockCipher>(
    secret: &[u8],
    plaintext: &[u8],
    nonce: Nonce,
) -> Envelope {
    let keys = DerivedKeys::derive(secret);
    let ivs = nonce.iv_pair();

    let stage1 = Zeroizing::new(S::encrypt_padded(keys.standard(), &ivs.outer, plaintext));

    let Ok(stage2) = cbc::cbc_encrypt::<C>(&stage1, keys.custom(), &ivs.inner) else {
        unreachable!("invariant: padded stage1 is block-aligned and the custom key is 10 bytes");
    };

    let tag = compute_tag(keys.mac(), &nonce, &stage2);
    let text = rot13(&STANDARD.encode(&stage2));

    let Ok(envelope) = Envelope::new(STANDARD.encode(nonce.as_bytes()), hex::encode(tag), text)
    else {
        unreachable!("invariant: base64 and hex output never contain NUL");
    };
    envelope
}

fn open_layers<S: StandardCipher, C: BlockCipher>(
    secret: &[u8],
    envelope: &Envelope,
) -> Result<Vec<u8>, NotAuthentic> {
    let nonce_bytes = STANDARD.decode(envelope.nonce()).map_err(|_| NotAuthentic)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(NotAuthentic);
    }
    let nonce = Nonce::from_slice(&nonce_bytes).ok_or(NotAuthentic)?;

    let keys = DerivedKeys::derive(secret);
    let ivs = nonce.iv_pair();

    let stage2 = STANDARD.decode(rot13(envelope.ciphertext())).map_err(|_| NotAuthentic)?;
    if stage2.is_empty() || stage2.len() % BLOCK_LEN != 0 {
        return Err(NotAuthentic);
    }

    let tag = decode_tag(envelope.tag())?;
    verify_tag(keys.mac(), &nonce, &stage2, &tag)?;

    let stage1 = Zeroizing::new(
        cbc::cbc_decrypt::<C>(&stage2, keys.custom(), &ivs.inner).map_err(|_| NotAuthentic)?,
    );

    S::decrypt_padded(keys.standard(), &ivs.outer, &stage1).map_err(|_| NotAuthentic)
}

/// HMAC-SHA256 over `nonce ‖ stage2`.
pub fn compute_tag(mac_key: &[u8], nonce: &Nonce, stage2: &[u8]) -> [u8; 32] {
    let mac = keyed_mac(mac_key, nonce, stage2);
    mac.finalize().into_bytes().into()
}

/// Check `tag` against `nonce ‖ stage2` in constant time.
///
/// # Errors
///
/// - `NotAuthentic` if the tag does not match (including wrong length)
pub fn verify_tag(
    mac_key: &[u8],
    nonce: &Nonce,
    stage2: &[u8],
    tag: &[u8],
) -> Result<(), NotAuthentic> {
    keyed_mac(mac_key, nonce, stage2).verify_slice(tag).map_err(|_| NotAuthentic)
}

/// Decode the tag field. Only the lowercase hex that sealing writes is
/// accepted; any other spelling of the same bytes is a changed field.
fn decode_tag(text: &str) -> Result<Vec<u8>, NotAuthentic> {
    if !text.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(NotAuthentic);
    }
    hex::decode(text).map_err(|_| NotAuthentic)
}

fn keyed_mac(mac_key: &[u8], nonce: &Nonce, stage2: &[u8]) -> HmacSha256 {
    let Ok(mut mac) = HmacSha256::new_from_slice(mac_key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(nonce.as_bytes());
    mac.update(stage2);
    mac
}
