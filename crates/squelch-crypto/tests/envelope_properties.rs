//! Property-based tests for sealing and opening envelopes
//!
//! These tests verify the contract of the pipeline for ALL inputs:
//!
//! 1. **Round-trip**: open(s, seal(s, p)) == p for any plaintext and secret
//! 2. **Integrity**: flipping any single bit of the tag or ciphertext is caught,
//!    both in the decoded bytes and in the text carried on the wire
//! 3. **Key separation**: a different secret never opens the envelope
//! 4. **Codec**: envelope bytes survive encode/decode in both layouts

use base64::{Engine as _, engine::general_purpose::STANDARD};
use proptest::prelude::*;
use squelch_crypto::{Envelope, NotAuthentic, Nonce, obfuscate::rot13, open, seal, seal_with_nonce};

fn arbitrary_secret() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

fn arbitrary_plaintext() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn arbitrary_nonce() -> impl Strategy<Value = Nonce> {
    any::<[u8; 16]>().prop_map(Nonce::from_bytes)
}

/// Flip one bit of one character of `text`, keeping only results that can
/// still sit in an envelope field.
fn flip_text_bit(text: &str, index: prop::sample::Index, bit: u8) -> Option<String> {
    let mut bytes = text.as_bytes().to_vec();
    let i = index.index(bytes.len());
    bytes[i] ^= 1 << bit;

    String::from_utf8(bytes).ok().filter(|s| !s.contains('\0'))
}

#[test]
fn prop_seal_open_roundtrip() {
    proptest!(|(secret in arbitrary_secret(), plaintext in arbitrary_plaintext())| {
        let envelope = seal(&secret, &plaintext);
        let opened = open(&secret, &envelope).expect("sealed envelope should open");

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(opened, plaintext);
    });
}

#[test]
fn prop_seal_with_nonce_is_deterministic() {
    proptest!(|(
        secret in arbitrary_secret(),
        plaintext in arbitrary_plaintext(),
        nonce in arbitrary_nonce()
    )| {
        let a = seal_with_nonce(&secret, &plaintext, nonce);
        let b = seal_with_nonce(&secret, &plaintext, nonce);

        prop_assert_eq!(a, b);
    });
}

#[test]
fn prop_ciphertext_is_block_aligned() {
    proptest!(|(secret in arbitrary_secret(), plaintext in arbitrary_plaintext())| {
        let envelope = seal(&secret, &plaintext);
        let stage2 = STANDARD.decode(rot13(envelope.ciphertext())).expect("valid base64");

        // PROPERTY: padding always adds between 1 and 8 bytes
        prop_assert_eq!(stage2.len() % 8, 0);
        prop_assert!(stage2.len() > plaintext.len());
        prop_assert!(stage2.len() <= plaintext.len() + 8);
    });
}

#[test]
fn prop_wrong_secret_is_not_authentic() {
    proptest!(|(
        secret in arbitrary_secret(),
        other in arbitrary_secret(),
        plaintext in arbitrary_plaintext()
    )| {
        prop_assume!(secret != other);

        let envelope = seal(&secret, &plaintext);
        prop_assert_eq!(open(&other, &envelope), Err(NotAuthentic));
    });
}

#[test]
fn prop_tag_bit_flip_is_not_authentic() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        byte in any::<prop::sample::Index>(),
        bit in 0u8..8
    )| {
        let envelope = seal(b"correct horse", &plaintext);

        let mut tag = hex::decode(envelope.tag()).expect("valid hex");
        let i = byte.index(tag.len());
        tag[i] ^= 1 << bit;

        let tampered = Envelope::new(envelope.nonce(), hex::encode(tag), envelope.ciphertext())
            .expect("no NUL bytes");
        prop_assert_eq!(open(b"correct horse", &tampered), Err(NotAuthentic));
    });
}

#[test]
fn prop_ciphertext_bit_flip_is_not_authentic() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        byte in any::<prop::sample::Index>(),
        bit in 0u8..8
    )| {
        let envelope = seal(b"correct horse", &plaintext);

        let mut stage2 = STANDARD.decode(rot13(envelope.ciphertext())).expect("valid base64");
        let i = byte.index(stage2.len());
        stage2[i] ^= 1 << bit;

        let text = rot13(&STANDARD.encode(&stage2));
        let tampered = Envelope::new(envelope.nonce(), envelope.tag(), text).expect("no NUL bytes");
        prop_assert_eq!(open(b"correct horse", &tampered), Err(NotAuthentic));
    });
}

#[test]
fn prop_tag_text_bit_flip_is_not_authentic() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8
    )| {
        let envelope = seal(b"correct horse", &plaintext);
        let Some(tag) = flip_text_bit(envelope.tag(), index, bit) else {
            return Ok(());
        };

        let tampered = Envelope::new(envelope.nonce(), tag, envelope.ciphertext())
            .expect("no NUL bytes");

        // PROPERTY: any change to the tag text is rejected, including case
        prop_assert_eq!(open(b"correct horse", &tampered), Err(NotAuthentic));
    });
}

#[test]
fn prop_ciphertext_text_bit_flip_is_not_authentic() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8
    )| {
        let envelope = seal(b"correct horse", &plaintext);
        let Some(text) = flip_text_bit(envelope.ciphertext(), index, bit) else {
            return Ok(());
        };

        let tampered = Envelope::new(envelope.nonce(), envelope.tag(), text)
            .expect("no NUL bytes");
        prop_assert_eq!(open(b"correct horse", &tampered), Err(NotAuthentic));
    });
}

#[test]
fn prop_nonce_bit_flip_is_not_authentic() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        nonce in arbitrary_nonce(),
        byte in 0usize..16,
        bit in 0u8..8
    )| {
        let envelope = seal_with_nonce(b"correct horse", &plaintext, nonce);

        let mut raw = *nonce.as_bytes();
        raw[byte] ^= 1 << bit;

        let tampered = Envelope::new(STANDARD.encode(raw), envelope.tag(), envelope.ciphertext())
            .expect("no NUL bytes");
        prop_assert_eq!(open(b"correct horse", &tampered), Err(NotAuthentic));
    });
}

#[test]
fn prop_envelope_codec_roundtrip() {
    proptest!(|(
        plaintext in arbitrary_plaintext(),
        route in "[a-z0-9#._-]{0,32}"
    )| {
        let envelope = seal(b"correct horse", &plaintext);

        let decoded = Envelope::decode(&envelope.encode()).expect("plain layout decodes");
        prop_assert_eq!(&decoded, &envelope);

        let routed = envelope.encode_routed(&route).expect("route has no NUL");
        let (decoded_route, decoded) = Envelope::decode_routed(&routed).expect("routed layout decodes");
        prop_assert_eq!(decoded_route, route);
        prop_assert_eq!(decoded, envelope);
    });
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..256))| {
        // Arbitrary bytes either parse or fail cleanly; opening a parsed
        // envelope under any secret fails cleanly too.
        if let Ok(envelope) = Envelope::decode(&bytes) {
            let _ = open(b"correct horse", &envelope);
        }
    });
}
