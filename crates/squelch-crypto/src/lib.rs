//! Squelch Envelope Cryptography
//!
//! Layered symmetric encryption for messages carried by the Squelch relay.
//! Everything here is a pure function of its inputs except
//! [`Nonce::generate`], which reads the OS RNG. Callers that need
//! deterministic output (tests, vectors) use [`seal_with_nonce`].
//!
//! # Layering
//!
//! One shared secret drives every layer. Each layer gets its own key through
//! a labeled hash, and one per-message nonce yields the IVs for both CBC
//! layers.
//!
//! ```text
//! Shared Secret ──┬─ derive("standard-cipher") → 128-bit IDEA key
//!                 ├─ derive("custom-cipher")   →  80-bit Skipjack-style key
//!                 └─ derive("mac")             → 256-bit HMAC key
//!
//! plaintext
//!    │  IDEA-CBC + PKCS#7      (iv_outer = nonce[..8])
//!    ▼
//! stage1
//!    │  Skipjack-style CBC     (iv_inner = SHA-256(nonce)[..8])
//!    ▼
//! stage2 ──► HMAC-SHA256(nonce ‖ stage2) → tag
//!    │  base64, then ROT13
//!    ▼
//! Envelope { nonce, tag, ciphertext }
//! ```
//!
//! # Security
//!
//! This is a deliberately layered stack with a home-grown inner cipher. It is
//! not a vetted construction.
//!
//! - The tag is verified (constant time) before any decryption is attempted
//! - Every failure while opening collapses into [`NotAuthentic`], so callers
//!   cannot tell a forged tag from a bad padding block
//! - Derived keys are zeroized on drop
//! - Nonce uniqueness per secret rests on the OS CSPRNG

#![forbid(unsafe_code)]

pub mod block;
pub mod cbc;
pub mod envelope;
mod error;
pub mod kdf;
pub mod nonce;
pub mod obfuscate;
pub mod pipeline;
pub mod standard;

pub use block::{BLOCK_LEN, BlockCipher, KEY_LEN as CUSTOM_KEY_LEN, Skipjack};
pub use self::cbc::{cbc_decrypt, cbc_encrypt};
pub use envelope::Envelope;
pub use error::{CryptoError, NotAuthentic};
pub use kdf::{DerivedKeys, derive};
pub use nonce::{IvPair, NONCE_LEN, Nonce};
pub use pipeline::{compute_tag, open, seal, seal_with_nonce, verify_tag};
pub use standard::{IdeaCbc, STANDARD_KEY_LEN, StandardCipher};
