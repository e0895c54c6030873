//! Cosmetic ciphertext obfuscation.
//!
//! ROT13 over the base64 ciphertext text. Adds no security: it only gives
//! sealed traffic a recognizable shape. The transform is an involution, so the
//! same function both applies and removes it.

/// Apply (or undo) the obfuscation.
///
/// ASCII letters rotate by 13; every other character passes through.
pub fn rot13(text: &str) -> String {
    text.chars().map(rotate).collect()
}

fn rotate(c: char) -> char {
    match c {
        'a'..='z' => rotate_within(c, b'a'),
        'A'..='Z' => rotate_within(c, b'A'),
        _ => c,
    }
}

fn rotate_within(c: char, base: u8) -> char {
    char::from((c as u8 - base + 13) % 26 + base)
}
