//! Fuzz target for envelope parsing and opening
//!
//! # Strategy
//!
//! - Raw: arbitrary bytes parsed as a routed envelope and opened
//! - Tampered: a genuine envelope with one field byte flipped
//!
//! # Invariants
//!
//! - Parsing and opening NEVER panic
//! - A genuine envelope opens to its plaintext
//! - A tampered envelope NEVER opens

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use squelch_crypto::{Envelope, Nonce, open, seal_with_nonce};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw { secret: Vec<u8>, payload: Vec<u8> },
    Tampered {
        secret: Vec<u8>,
        plaintext: Vec<u8>,
        nonce: [u8; 16],
        field: u8,
        index: u16,
        flip: u8,
    },
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw { secret, payload } => {
            if let Ok((_, envelope)) = Envelope::decode_routed(&payload) {
                let _ = open(&secret, &envelope);
            }
        },
        Input::Tampered { secret, plaintext, nonce, field, index, flip } => {
            let envelope = seal_with_nonce(&secret, &plaintext, Nonce::from_bytes(nonce));
            assert_eq!(open(&secret, &envelope).expect("genuine envelope must open"), plaintext);

            if flip == 0 {
                return;
            }

            let mut fields = [
                envelope.nonce().as_bytes().to_vec(),
                envelope.tag().as_bytes().to_vec(),
                envelope.ciphertext().as_bytes().to_vec(),
            ];
            let target = &mut fields[usize::from(field) % 3];
            let i = usize::from(index) % target.len();
            target[i] ^= flip;

            let (Ok(nonce), Ok(tag), Ok(ciphertext)) = (
                String::from_utf8(fields[0].clone()),
                String::from_utf8(fields[1].clone()),
                String::from_utf8(fields[2].clone()),
            ) else {
                return;
            };
            let Ok(tampered) = Envelope::new(nonce, tag, ciphertext) else {
                return;
            };

            assert!(open(&secret, &tampered).is_err(), "tampered envelope opened");
        },
    }
});
