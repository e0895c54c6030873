//! Skipjack-style 64-bit block cipher.
//!
//! A 32-round unbalanced Feistel network over four 16-bit words with an
//! 80-bit key. The keyed G permutation is a four-round byte Feistel built on
//! the Skipjack F-table. There is no key schedule state: every call is a pure
//! function of `(block, key)`.
//!
//! # Round structure
//!
//! Words are read big-endian: `w1 = block[0..2]`, ..., `w4 = block[6..8]`.
//!
//! ```text
//! Rule A (rounds 1-8, 17-24)       Rule B (rounds 9-16, 25-32)
//!   w1' = G(w1)                      w1' = w4
//!   w2' = G(w1) ^ round ^ w4         w2' = G(w1)
//!   w3' = w2                         w3' = w1 ^ w2 ^ round
//!   w4' = w3                         w4' = w3
//! ```
//!
//! Rule A places `G(w1)` in `w1` and the mixed word in `w2`, so ciphertexts do
//! not match published Skipjack vectors even though F, G and Rule B do.

/// Block size in bytes
pub const BLOCK_LEN: usize = 8;

/// Key size in bytes (80 bits)
pub const KEY_LEN: usize = 10;

/// Number of rounds
pub const ROUNDS: u16 = 32;

/// A cipher over 8-byte blocks that the CBC mode can chain.
///
/// Implementations are stateless: the key is passed on every call.
pub trait BlockCipher {
    /// Exact key length in bytes
    const KEY_LEN: usize;

    /// Validated key representation
    type Key;

    /// Validate a raw key. `None` if the length is not [`Self::KEY_LEN`].
    fn key_from_slice(key: &[u8]) -> Option<Self::Key>;

    /// Encrypt one block.
    fn encrypt_block(block: &[u8; BLOCK_LEN], key: &Self::Key) -> [u8; BLOCK_LEN];

    /// Decrypt one block. Exact inverse of [`Self::encrypt_block`].
    fn decrypt_block(block: &[u8; BLOCK_LEN], key: &Self::Key) -> [u8; BLOCK_LEN];
}

/// The custom inner-layer cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Skipjack;

impl BlockCipher for Skipjack {
    const KEY_LEN: usize = KEY_LEN;

    type Key = [u8; KEY_LEN];

    fn key_from_slice(key: &[u8]) -> Option<Self::Key> {
        <[u8; KEY_LEN]>::try_from(key).ok()
    }

    fn encrypt_block(block: &[u8; BLOCK_LEN], key: &Self::Key) -> [u8; BLOCK_LEN] {
        encrypt_block(block, key)
    }

    fn decrypt_block(block: &[u8; BLOCK_LEN], key: &Self::Key) -> [u8; BLOCK_LEN] {
        decrypt_block(block, key)
    }
}

/// Skipjack F-table (a fixed byte permutation).
const F: [u8; 256] = [
    0xa3, 0xd7, 0x09, 0x83, 0xf8, 0x48, 0xf6, 0xf4, 0xb3, 0x21, 0x15, 0x78, 0x99, 0xb1, 0xaf, 0xf9,
    0xe7, 0x2d, 0x4d, 0x8a, 0xce, 0x4c, 0xca, 0x2e, 0x52, 0x95, 0xd9, 0x1e, 0x4e, 0x38, 0x44, 0x28,
    0x0a, 0xdf, 0x02, 0xa0, 0x17, 0xf1, 0x60, 0x68, 0x12, 0xb7, 0x7a, 0xc3, 0xe9, 0xfa, 0x3d, 0x53,
    0x96, 0x84, 0x6b, 0xba, 0xf2, 0x63, 0x9a, 0x19, 0x7c, 0xae, 0xe5, 0xf5, 0xf7, 0x16, 0x6a, 0xa2,
    0x39, 0xb6, 0x7b, 0x0f, 0xc1, 0x93, 0x81, 0x1b, 0xee, 0xb4, 0x1a, 0xea, 0xd0, 0x91, 0x2f, 0xb8,
    0x55, 0xb9, 0xda, 0x85, 0x3f, 0x41, 0xbf, 0xe0, 0x5a, 0x58, 0x80, 0x5f, 0x66, 0x0b, 0xd8, 0x90,
    0x35, 0xd5, 0xc0, 0xa7, 0x33, 0x06, 0x65, 0x69, 0x45, 0x00, 0x94, 0x56, 0x6d, 0x98, 0x9b, 0x76,
    0x97, 0xfc, 0xb2, 0xc2, 0xb0, 0xfe, 0xdb, 0x20, 0xe1, 0xeb, 0xd6, 0xe4, 0xdd, 0x47, 0x4a, 0x1d,
    0x42, 0xed, 0x9e, 0x6e, 0x49, 0x3c, 0xcd, 0x43, 0x27, 0xd2, 0x07, 0xd4, 0xde, 0xc7, 0x67, 0x18,
    0x89, 0xcb, 0x30, 0x1f, 0x8d, 0xc6, 0x8f, 0xaa, 0xc8, 0x74, 0xdc, 0xc9, 0x5d, 0x5c, 0x31, 0xa4,
    0x70, 0x88, 0x61, 0x2c, 0x9f, 0x0d, 0x2b, 0x87, 0x50, 0x82, 0x54, 0x64, 0x26, 0x7d, 0x03, 0x40,
    0x34, 0x4b, 0x1c, 0x73, 0xd1, 0xc4, 0xfd, 0x3b, 0xcc, 0xfb, 0x7f, 0xab, 0xe6, 0x3e, 0x5b, 0xa5,
    0xad, 0x04, 0x23, 0x9c, 0x14, 0x51, 0x22, 0xf0, 0x29, 0x79, 0x71, 0x7e, 0xff, 0x8c, 0x0e, 0xe2,
    0x0c, 0xef, 0xbc, 0x72, 0x75, 0x6f, 0x37, 0xa1, 0xec, 0xd3, 0x8e, 0x62, 0x8b, 0x86, 0x10, 0xe8,
    0x08, 0x77, 0x11, 0xbe, 0x92, 0x4f, 0x24, 0xc5, 0x32, 0x36, 0x9d, 0xcf, 0xf3, 0xa6, 0xbb, 0xac,
    0x5e, 0x6c, 0xa9, 0x13, 0x57, 0x25, 0xb5, 0xe3, 0xbd, 0xa8, 0x3a, 0x01, 0x05, 0x59, 0x2a, 0x46,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    A,
    B,
}

fn rule(round: u16) -> Rule {
    match round {
        1..=8 | 17..=24 => Rule::A,
        _ => Rule::B,
    }
}

/// Encrypt one 8-byte block under a 10-byte key.
pub fn encrypt_block(block: &[u8; BLOCK_LEN], key: &[u8; KEY_LEN]) -> [u8; BLOCK_LEN] {
    let [mut w1, mut w2, mut w3, mut w4] = load_words(block);

    for round in 1..=ROUNDS {
        let mixed = g(round, w1, key);
        [w1, w2, w3, w4] = match rule(round) {
            Rule::A => [mixed, mixed ^ round ^ w4, w2, w3],
            Rule::B => [w4, mixed, w1 ^ w2 ^ round, w3],
        };
    }

    store_words([w1, w2, w3, w4])
}

/// Decrypt one 8-byte block under a 10-byte key.
///
/// Runs rounds 32 down to 1, undoing each rule algebraically.
pub fn decrypt_block(block: &[u8; BLOCK_LEN], key: &[u8; KEY_LEN]) -> [u8; BLOCK_LEN] {
    let [mut w1, mut w2, mut w3, mut w4] = load_words(block);

    for round in (1..=ROUNDS).rev() {
        [w1, w2, w3, w4] = match rule(round) {
            Rule::A => [g_inv(round, w1, key), w3, w4, w1 ^ w2 ^ round],
            Rule::B => {
                let prev_w1 = g_inv(round, w2, key);
                [prev_w1, w3 ^ prev_w1 ^ round, w4, w1]
            },
        };
    }

    store_words([w1, w2, w3, w4])
}

/// Four key bytes for `round`, taken cyclically from the 10-byte key.
fn round_key(round: u16, key: &[u8; KEY_LEN]) -> [u8; 4] {
    let base = 4 * usize::from(round - 1);
    std::array::from_fn(|j| key[(base + j) % KEY_LEN])
}

fn g(round: u16, word: u16, key: &[u8; KEY_LEN]) -> u16 {
    let cv = round_key(round, key);
    let [g1, g2] = word.to_be_bytes();

    let g3 = F[usize::from(g2 ^ cv[0])] ^ g1;
    let g4 = F[usize::from(g3 ^ cv[1])] ^ g2;
    let g5 = F[usize::from(g4 ^ cv[2])] ^ g3;
    let g6 = F[usize::from(g5 ^ cv[3])] ^ g4;

    u16::from_be_bytes([g5, g6])
}

fn g_inv(round: u16, word: u16, key: &[u8; KEY_LEN]) -> u16 {
    let cv = round_key(round, key);
    let [g5, g6] = word.to_be_bytes();

    let g4 = F[usize::from(g5 ^ cv[3])] ^ g6;
    let g3 = F[usize::from(g4 ^ cv[2])] ^ g5;
    let g2 = F[usize::from(g3 ^ cv[1])] ^ g4;
    let g1 = F[usize::from(g2 ^ cv[0])] ^ g3;

    u16::from_be_bytes([g1, g2])
}

fn load_words(block: &[u8; BLOCK_LEN]) -> [u16; 4] {
    std::array::from_fn(|i| u16::from_be_bytes([block[2 * i], block[2 * i + 1]]))
}

fn store_words(words: [u16; 4]) -> [u8; BLOCK_LEN] {
    let mut out = [0u8; BLOCK_LEN];
    for (chunk, word) in out.chunks_exact_mut(2).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}
